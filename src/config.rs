use std::env;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;

use crate::LinkCodec;

/// Environment variable holding the share link secret.
pub const SECRET_ENV_VAR: &str = "PROJECT_ENCRYPTION_KEY";

static GLOBAL_CODEC: OnceCell<LinkCodec> = OnceCell::new();

/// How the configured secret is turned into key material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyDerivation {
    /// Truncate or right-pad the secret with `'0'` to 32 bytes for AES, and key
    /// the IV derivation with the raw secret. Compatible with already issued links.
    #[default]
    Legacy,
    /// Expand the secret with HKDF-SHA256 into independent cipher and IV keys.
    /// Produces different tokens than `Legacy`.
    Hkdf,
}

/// Configuring share link key material.
#[derive(Clone)]
pub struct Config {
    pub(crate) secret: Vec<u8>,
    pub(crate) key_derivation: KeyDerivation,
    pub(crate) min_secret_length: usize,
}

/// Errors in share link configuration.  These are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("share link secret is not set (expected environment variable {var})")]
    MissingSecret { var: String },
    #[error("share link secret is empty")]
    EmptySecret,
    #[error("share link secret is {length} bytes, at least {minimum} required")]
    SecretTooShort { length: usize, minimum: usize },
    #[error("minimum secret length must be at least 1")]
    InvalidMinimumLength,
    #[error("share link codec is already initialized")]
    AlreadyInitialized,
}

impl Config {
    /// Creates a new configuration with the given `secret` and other settings in
    /// default values.
    /// - `key_derivation` defaults to [`KeyDerivation::Legacy`], which keeps tokens
    ///   identical to links issued before.
    /// - `min_secret_length` defaults to 1, i.e. any non-empty secret is accepted.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Config {
            secret: secret.as_ref().to_vec(),
            key_derivation: KeyDerivation::Legacy,
            min_secret_length: 1,
        }
    }

    /// Reads the secret from the `PROJECT_ENCRYPTION_KEY` environment variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var(SECRET_ENV_VAR)
    }

    /// Reads the secret from the environment variable `var`.
    pub fn from_env_var(var: &str) -> Result<Self, ConfigError> {
        match env::var(var) {
            Ok(secret) => Ok(Config::new(secret)),
            Err(_) => Err(ConfigError::MissingSecret {
                var: var.to_string(),
            }),
        }
    }

    /// Sets the key derivation scheme.
    pub fn key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.key_derivation = key_derivation;
        self
    }

    /// Sets the minimum accepted secret length in bytes.
    /// The value must be at least 1.
    pub fn min_secret_length(mut self, min_secret_length: usize) -> Result<Self, ConfigError> {
        if min_secret_length == 0 {
            Err(ConfigError::InvalidMinimumLength)
        } else {
            self.min_secret_length = min_secret_length;
            Ok(self)
        }
    }

    /// Builds the process-wide codec used by the Serde integration of
    /// [`ShareLink`](crate::ShareLink).  Can be called once per process; changing
    /// the key requires a restart.
    pub fn set_global(config: &Config) -> Result<(), ConfigError> {
        let codec = LinkCodec::from_config(config)?;
        GLOBAL_CODEC
            .set(codec)
            .map_err(|_| ConfigError::AlreadyInitialized)?;
        info!(key_derivation = ?config.key_derivation, "share link codec initialized");
        Ok(())
    }

    pub(crate) fn global_codec() -> Option<&'static LinkCodec> {
        GLOBAL_CODEC.get()
    }
}
