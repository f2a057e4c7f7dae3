use std::fmt;

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::config::{Config, ConfigError, KeyDerivation};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

// Filler for secrets shorter than `KEY_LEN` under `KeyDerivation::Legacy`.
const PAD_BYTE: u8 = b'0';

/// Symmetric key material for share links.
///
/// Holds the AES-256 key and a keyed HMAC-SHA256 instance used to derive IVs.
/// Immutable once built; construct it at startup and share it by reference.
#[derive(Clone)]
pub struct SecretKey {
    cipher_key: [u8; KEY_LEN],
    iv_mac: HmacSha256,
}

impl SecretKey {
    /// Loads a key from `secret` using [`KeyDerivation::Legacy`]: the first 32 bytes
    /// of the secret, right-padded with ASCII `'0'` if it is shorter.
    ///
    /// **Security note:** short secrets are padded with a known byte, which reduces
    /// the effective key size.  Prefer a random secret of at least 32 bytes.
    pub fn load(secret: impl AsRef<[u8]>) -> Result<SecretKey, ConfigError> {
        SecretKey::derive(secret, KeyDerivation::Legacy)
    }

    /// Builds a key from `secret` with the given derivation scheme.
    pub fn derive(
        secret: impl AsRef<[u8]>,
        key_derivation: KeyDerivation,
    ) -> Result<SecretKey, ConfigError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        let key = match key_derivation {
            KeyDerivation::Legacy => {
                if secret.len() < KEY_LEN {
                    warn!(
                        length = secret.len(),
                        "share link secret is shorter than 32 bytes and will be padded"
                    );
                }
                SecretKey {
                    cipher_key: pad_or_truncate(secret),
                    iv_mac: new_mac(secret),
                }
            }
            KeyDerivation::Hkdf => {
                let hkdf = Hkdf::<Sha256>::new(None, secret);
                let mut cipher_key = [0u8; KEY_LEN];
                let mut mac_key = [0u8; KEY_LEN];
                hkdf.expand(b"share-link/aes-256-cbc", &mut cipher_key)
                    .expect("Length 32 should be valid");
                hkdf.expand(b"share-link/iv", &mut mac_key)
                    .expect("Length 32 should be valid");
                SecretKey {
                    cipher_key,
                    iv_mac: new_mac(&mac_key),
                }
            }
        };
        Ok(key)
    }

    /// Builds a key from a [`Config`], enforcing its minimum secret length.
    pub fn from_config(config: &Config) -> Result<SecretKey, ConfigError> {
        if config.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if config.secret.len() < config.min_secret_length {
            return Err(ConfigError::SecretTooShort {
                length: config.secret.len(),
                minimum: config.min_secret_length,
            });
        }
        SecretKey::derive(&config.secret, config.key_derivation)
    }

    pub(crate) fn cipher_key(&self) -> &[u8; KEY_LEN] {
        &self.cipher_key
    }

    pub(crate) fn iv_mac(&self) -> &HmacSha256 {
        &self.iv_mac
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SecretKey { .. }")
    }
}

fn pad_or_truncate(secret: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [PAD_BYTE; KEY_LEN];
    let length = secret.len().min(KEY_LEN);
    key[..length].copy_from_slice(&secret[..length]);
    key
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}
