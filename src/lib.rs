//! `share-link` turns internal resource identifiers into stable, URL safe tokens and back,
//! so that an access-controlled resource can be opened through a public link without a
//! server-side lookup table.
//!
//! A token is `base64url(IV ‖ AES-256-CBC(identifier))` without padding.  The IV is the
//! first 16 bytes of HMAC-SHA256 over the identifier, keyed by the configured secret, so
//! the same identifier always maps to the same token and a token can be reproduced on
//! demand instead of being stored.
//!
//! Decoding failures are never explained to the caller.  Whether a token is malformed,
//! was made with another key, or was tampered with, the result is the same
//! [`Error::InvalidShareLink`].
//!
//! Please note that this is not authenticated encryption.  There is no MAC, so a
//! tampered token is only rejected when its padding or UTF-8 no longer checks out, and
//! anyone holding the secret can mint links for any identifier.  Changing the secret
//! invalidates every link issued before.
//!
//! # Usage
//!
//! ## Codec API
//!
//! ```
//! use share_link::{Config, LinkCodec};
//!
//! let codec = LinkCodec::from_config(&Config::new("testsecret")).unwrap();
//! let token = codec.encode("0f1e2d3c-0000-0000-0000-000000000000");
//! let decoded = codec.decode(&token).unwrap();
//! assert_eq!(decoded, "0f1e2d3c-0000-0000-0000-000000000000");
//! ```
//!
//! ## Share links
//!
//! [`ShareLink`] builds the public path or URL for an identifier and resolves an incoming
//! path back to it.  It also serializes to its token with Serde once a process-wide codec
//! is installed with [`Config::set_global`].
//!
//! ```
//! use share_link::{Error, LinkCodec, SecretKey, ShareLink};
//!
//! let codec = LinkCodec::new(SecretKey::load("testsecret").unwrap());
//! let path = ShareLink::new("project-42").path(&codec);
//! assert_eq!(path, "/public/projects/axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ");
//!
//! let link = ShareLink::resolve_path(&codec, &path).unwrap();
//! assert_eq!(link.identifier(), "project-42");
//! assert_eq!(
//!     ShareLink::resolve_path(&codec, "/public/projects/bogus"),
//!     Err(Error::InvalidShareLink)
//! );
//! ```

mod cipher;
mod codec;
mod config;
mod iv;
mod key;
mod link;
mod token;

pub use codec::{Error, LinkCodec};
pub use config::{Config, ConfigError, KeyDerivation, SECRET_ENV_VAR};
pub use key::{SecretKey, KEY_LEN};
pub use link::{ShareLink, PUBLIC_PROJECTS_PATH};
