use thiserror::Error as ThisError;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::iv::{derive_iv, IV_LEN};
use crate::{cipher, token, SecretKey};

/// Error returned when a share link cannot be resolved.
///
/// Deliberately carries no detail: a malformed token, a wrong key and a tampered
/// ciphertext are indistinguishable to the caller.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("link invalid or no longer available")]
    InvalidShareLink,
}

/// Internal reason a token failed to decode.  Logged, never returned.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    #[error("token is not well-formed base64url or is too short")]
    Format,
    #[error("ciphertext padding is invalid")]
    Padding,
    #[error("decrypted identifier is not valid UTF-8")]
    Encoding,
}

/// Core encoder/decoder for share link tokens.
pub struct LinkCodec {
    key: SecretKey,
}

impl LinkCodec {
    /// Creates a new `LinkCodec` using `key`.
    ///
    /// **Security note:** anyone holding the secret can mint and read tokens for any
    /// identifier, and tokens issued under one key never decode under another.
    ///
    /// # Examples
    ///
    /// ```
    /// use share_link::{LinkCodec, SecretKey};
    ///
    /// let codec = LinkCodec::new(SecretKey::load("your-secret").unwrap());
    /// ```
    pub fn new(key: SecretKey) -> LinkCodec {
        LinkCodec { key }
    }

    /// Creates a new `LinkCodec` from a [`Config`].
    pub fn from_config(config: &Config) -> Result<LinkCodec, ConfigError> {
        Ok(LinkCodec::new(SecretKey::from_config(config)?))
    }

    /// The process-wide codec installed with [`Config::set_global`], if any.
    pub fn global() -> Option<&'static LinkCodec> {
        Config::global_codec()
    }

    /// Encrypts `identifier` into a URL safe token.
    ///
    /// The IV is derived from the identifier and the key, so the same identifier
    /// always produces the same token.
    ///
    /// # Examples
    ///
    /// ```
    /// use share_link::{LinkCodec, SecretKey};
    ///
    /// let codec = LinkCodec::new(SecretKey::load("testsecret").unwrap());
    /// let token = codec.encode("project-42");
    ///
    /// assert_eq!(token, "axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ");
    /// ```
    pub fn encode(&self, identifier: &str) -> String {
        let iv = derive_iv(identifier, &self.key);
        let ciphertext = cipher::encrypt(identifier.as_bytes(), &self.key, &iv);
        debug_assert_eq!(IV_LEN + ciphertext.len(), token::encoded_len(identifier.len()));
        token::encode(&iv, &ciphertext)
    }

    /// Decodes a token back into the identifier it was made from.
    ///
    /// Every failure is reported as [`Error::InvalidShareLink`].
    ///
    /// # Examples
    ///
    /// ```
    /// use share_link::{Error, LinkCodec, SecretKey};
    ///
    /// let codec = LinkCodec::new(SecretKey::load("testsecret").unwrap());
    /// let decoded = codec.decode("axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ").unwrap();
    ///
    /// assert_eq!(decoded, "project-42");
    /// assert_eq!(codec.decode("not-a-token"), Err(Error::InvalidShareLink));
    /// ```
    pub fn decode(&self, token: &str) -> Result<String, Error> {
        self.try_decode(token).map_err(|failure| {
            debug!(reason = %failure, "share link rejected");
            Error::InvalidShareLink
        })
    }

    /// Encodes a UUID in its lowercase hyphenated form.
    pub fn encode_uuid(&self, id: &Uuid) -> String {
        self.encode(&id.hyphenated().to_string())
    }

    /// Decodes a token that must hold a UUID.
    pub fn decode_uuid(&self, token: &str) -> Result<Uuid, Error> {
        let identifier = self.decode(token)?;
        Uuid::parse_str(&identifier).map_err(|_| {
            debug!("share link does not hold a UUID");
            Error::InvalidShareLink
        })
    }

    fn try_decode(&self, token: &str) -> Result<String, Failure> {
        let (iv, ciphertext) = token::decode(token)?;
        let plaintext = cipher::decrypt(&ciphertext, &self.key, &iv)?;
        String::from_utf8(plaintext).map_err(|_| Failure::Encoding)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::KeyDerivation;
    use rand::Rng;

    const TEST_ID: &str = "0f1e2d3c-0000-0000-0000-000000000000";

    fn codec(secret: &str) -> LinkCodec {
        LinkCodec::new(SecretKey::load(secret).unwrap())
    }

    fn random_uuid(rng: &mut impl Rng) -> Uuid {
        uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
    }

    #[test]
    fn test_known_tokens() {
        let test_cases = [
            (
                "testsecret",
                TEST_ID,
                "nI7GoHS0AOJt9nIeiRyS29RGGgdRpyd-gJMxcQfX4DLwfF29YCsfbXRYQDpEvqnjxIZRxJSzu0V0wCn1dAEa3w",
            ),
            ("testsecret", "", "iDoTafqJ28QLMkltvsQXQjmf-YcQLuFEjLOoYa5uE6k"),
            (
                "testsecret",
                "project-42",
                "axDR6WHHTVjKj2quLAbRHJTSjohT04pdRgErEoG1tAQ",
            ),
            (
                "a-much-longer-secret-that-exceeds-thirty-two-bytes!!",
                TEST_ID,
                "WoQiWh6i1e8PO-BkLYaECrX0mOeC1Hyg6V6XPkxZ6i4OHzezRBqKjLPYDrz9qg-wGi3qDusc5dmnH9NCB8zTew",
            ),
            (
                "othersecret",
                TEST_ID,
                "SbrEJDj9Gh0xpO_4ffqdMx5dEsP7iA9GOvG-xQ-crwjyklLekmQoRQSeWZ2Ey4fMVKKW7o9vU1xq2hMivpvaUg",
            ),
        ];

        for (secret, input, expected) in test_cases {
            let codec = codec(secret);
            assert_eq!(codec.encode(input), expected);
            assert_eq!(codec.decode(expected).unwrap(), input);
        }
    }

    #[test]
    fn test_deterministic() {
        let codec = codec("testsecret");
        let token = codec.encode(TEST_ID);
        assert_eq!(codec.encode(TEST_ID), token);

        // A fresh codec from the same secret behaves like a restarted process.
        assert_eq!(self::codec("testsecret").encode(TEST_ID), token);
    }

    #[test]
    fn test_token_length() {
        let codec = codec("testsecret");
        for identifier in ["", "a", "fifteen-bytes!!", "sixteen-bytes!!!", TEST_ID, "ünïcödé"] {
            let token = codec.encode(identifier);
            let bytes = token::decode(&token).unwrap();
            assert_eq!(
                16 + bytes.1.len(),
                token::encoded_len(identifier.len()),
                "identifier {:?}",
                identifier
            );
            assert!(!token.contains('='));
        }
    }

    #[test]
    fn test_random_roundtrips() {
        let codec = codec("testsecret");
        let mut rng = rand::thread_rng();
        let mut tokens = HashSet::new();

        for _ in 0..10_000 {
            let id = random_uuid(&mut rng);
            let encoded = codec.encode_uuid(&id);
            let decoded = codec.decode_uuid(&encoded).expect("Decoding failed");

            assert_eq!(decoded, id, "Failed at id: {}", id);
            assert!(tokens.insert(encoded), "Collision at id: {}", id);
        }
    }

    #[test]
    fn test_arbitrary_strings() {
        let codec = codec("testsecret");
        let mut rng = rand::thread_rng();

        for length in 0..100 {
            let identifier: String = (0..length).map(|_| rng.gen::<char>()).collect();
            assert_eq!(codec.decode(&codec.encode(&identifier)).unwrap(), identifier);
        }
    }

    #[test]
    fn test_wrong_key() {
        let codec = codec("testsecret");
        let other = self::codec("othersecret");
        let token = codec.encode(TEST_ID);
        assert_eq!(other.decode(&token), Err(Error::InvalidShareLink));

        let mut rng = rand::thread_rng();
        let trials = 1_000;
        let mut rejected = 0;
        for _ in 0..trials {
            let id = random_uuid(&mut rng).to_string();
            match other.decode(&codec.encode(&id)) {
                Err(Error::InvalidShareLink) => rejected += 1,
                Ok(decoded) => assert_ne!(decoded, id),
            }
        }
        assert!(rejected * 100 >= trials * 99, "only {} rejected", rejected);
    }

    #[test]
    fn test_key_derivations_are_incompatible() {
        let legacy = codec("testsecret");
        let hkdf = LinkCodec::new(SecretKey::derive("testsecret", KeyDerivation::Hkdf).unwrap());

        let token = hkdf.encode(TEST_ID);
        assert_ne!(token, legacy.encode(TEST_ID));
        assert_eq!(hkdf.decode(&token).unwrap(), TEST_ID);
        assert_eq!(legacy.decode(&token), Err(Error::InvalidShareLink));
    }

    #[test]
    fn test_tampered_ciphertext() {
        // Without a MAC, about one in 256 flips still unpads cleanly, so only a
        // large majority of rejections is expected.
        let codec = codec("testsecret");
        let mut rng = rand::thread_rng();
        let trials = 1_000;
        let mut rejected = 0;

        for _ in 0..trials {
            let id = random_uuid(&mut rng).to_string();
            let (iv, mut ciphertext) = token::decode(&codec.encode(&id)).unwrap();
            let position = rng.gen_range(0..ciphertext.len());
            ciphertext[position] ^= rng.gen_range(1..=255u8);

            match codec.decode(&token::encode(&iv, &ciphertext)) {
                Err(Error::InvalidShareLink) => rejected += 1,
                Ok(decoded) => assert_ne!(decoded, id),
            }
        }
        assert!(rejected * 100 >= trials * 90, "only {} rejected", rejected);
    }

    #[test]
    fn test_iv_tampering_is_not_detected() {
        // CBC without a MAC: flipping an IV bit flips the same bit of the first
        // plaintext block.
        let codec = codec("testsecret");
        let (mut iv, ciphertext) = token::decode(&codec.encode(TEST_ID)).unwrap();
        iv[0] ^= 0x01;
        assert_eq!(
            codec.decode(&token::encode(&iv, &ciphertext)).unwrap(),
            "1f1e2d3c-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_decode_errors() {
        let codec = codec("testsecret");
        let valid = codec.encode(TEST_ID);

        assert_eq!(codec.decode(""), Err(Error::InvalidShareLink));
        assert_eq!(codec.decode("AAAAAAAAAA"), Err(Error::InvalidShareLink));
        assert_eq!(codec.decode(&format!("{}=", valid)), Err(Error::InvalidShareLink));
        assert_eq!(
            codec.decode(&valid.replace('-', "+")),
            Err(Error::InvalidShareLink)
        );
        assert_eq!(
            codec.decode(&valid.replace('-', "/")),
            Err(Error::InvalidShareLink)
        );

        // IV with no ciphertext, and a ciphertext that is not block aligned.
        let (iv, ciphertext) = token::decode(&valid).unwrap();
        assert_eq!(codec.decode(&token::encode(&iv, &[])), Err(Error::InvalidShareLink));
        assert_eq!(
            codec.decode(&token::encode(&iv, &ciphertext[..20])),
            Err(Error::InvalidShareLink)
        );

        // And just to validate the above, check that the correct string does decode.
        assert_eq!(codec.decode(&valid).unwrap(), TEST_ID);
    }

    #[test]
    fn test_failures_are_collapsed() {
        let codec = codec("testsecret");
        let key = SecretKey::load("testsecret").unwrap();

        let iv = [0u8; 16];
        let not_utf8 = token::encode(&iv, &cipher::encrypt(&[0xff, 0xfe, 0xfd], &key, &iv));
        let bad_padding = token::encode(&iv, &[0u8; 16]);

        assert_eq!(codec.try_decode("!"), Err(Failure::Format));
        assert_eq!(codec.try_decode(&not_utf8), Err(Failure::Encoding));
        assert_eq!(codec.try_decode(&bad_padding), Err(Failure::Padding));

        for token in ["!", not_utf8.as_str(), bad_padding.as_str()] {
            let err = codec.decode(token).unwrap_err();
            assert_eq!(err, Error::InvalidShareLink);
            assert_eq!(err.to_string(), "link invalid or no longer available");
        }
    }

    #[test]
    fn test_decode_uuid_rejects_other_identifiers() {
        let codec = codec("testsecret");
        assert_eq!(
            codec.decode_uuid(&codec.encode("project-42")),
            Err(Error::InvalidShareLink)
        );
        assert_eq!(
            codec.encode_uuid(&Uuid::parse_str("0F1E2D3C-0000-0000-0000-000000000000").unwrap()),
            codec.encode(TEST_ID)
        );
    }

    #[test]
    fn test_concurrent_use() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LinkCodec>();

        let codec = codec("testsecret");
        let expected = codec.encode(TEST_ID);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let token = codec.encode(TEST_ID);
                        assert_eq!(token, expected);
                        assert_eq!(codec.decode(&token).unwrap(), TEST_ID);
                    }
                });
            }
        });
    }
}
