use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, LinkCodec};

/// Route prefix under which public share links are served.
pub const PUBLIC_PROJECTS_PATH: &str = "/public/projects/";

/// A resource identifier exposed through a public share link.
///
/// When serialized with Serde, the identifier is encrypted with the global codec
/// (see [`Config::set_global`](crate::Config::set_global)) into its token.
/// Deserialization decodes the token back into the identifier.
///
/// # Examples
///
/// ```
/// use share_link::{Config, ShareLink};
///
/// #[derive(serde::Serialize)]
/// struct SharedProject {
///     pub link: ShareLink,
/// }
///
/// Config::set_global(&Config::new("testsecret")).unwrap();
/// let project = SharedProject { link: ShareLink::new("project-42") };
/// let json = serde_json::to_string(&project).unwrap();
/// assert_eq!(json, "{\"link\":\"axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ\"}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareLink {
    identifier: String,
}

impl ShareLink {
    /// Creates a share link for an identifier the caller has already authorized.
    pub fn new(identifier: impl Into<String>) -> Self {
        ShareLink {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn into_identifier(self) -> String {
        self.identifier
    }

    pub fn token(&self, codec: &LinkCodec) -> String {
        codec.encode(&self.identifier)
    }

    /// The public path, `/public/projects/{token}`.
    pub fn path(&self, codec: &LinkCodec) -> String {
        format!("{}{}", PUBLIC_PROJECTS_PATH, self.token(codec))
    }

    /// The full public URL under `base_url`.
    ///
    /// ```
    /// use share_link::{LinkCodec, SecretKey, ShareLink};
    ///
    /// let codec = LinkCodec::new(SecretKey::load("testsecret").unwrap());
    /// let url = ShareLink::new("project-42").url(&codec, "https://example.org/");
    /// assert_eq!(
    ///     url,
    ///     "https://example.org/public/projects/axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ"
    /// );
    /// ```
    pub fn url(&self, codec: &LinkCodec, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path(codec))
    }

    /// Resolves a token taken from an incoming request.
    pub fn resolve(codec: &LinkCodec, token: &str) -> Result<ShareLink, Error> {
        codec.decode(token).map(ShareLink::new)
    }

    /// Resolves a request path of the form `/public/projects/{token}`.
    pub fn resolve_path(codec: &LinkCodec, path: &str) -> Result<ShareLink, Error> {
        match path.strip_prefix(PUBLIC_PROJECTS_PATH) {
            Some(token) if !token.is_empty() && !token.contains('/') => {
                ShareLink::resolve(codec, token)
            }
            _ => Err(Error::InvalidShareLink),
        }
    }
}

impl Serialize for ShareLink {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let codec = LinkCodec::global()
            .ok_or_else(|| serde::ser::Error::custom("share link codec is not initialized"))?;
        serializer.serialize_str(&self.token(codec))
    }
}

impl<'de> Deserialize<'de> for ShareLink {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        let codec = LinkCodec::global()
            .ok_or_else(|| serde::de::Error::custom(Error::InvalidShareLink))?;
        ShareLink::resolve(codec, &token).map_err(serde::de::Error::custom)
    }
}
