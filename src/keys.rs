//! RSA key material for signing and verification.
//!
//! [`FileKeyProvider`] re-reads and re-parses the PEM files on every call,
//! so rotating the files on disk takes effect on the next request.
//! [`StaticKeyProvider`] parses them once at startup. Either way a failure
//! surfaces as [`TokenError::KeyMaterial`] for the current operation only.

use crate::config::Config;
use crate::error::TokenError;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Keys needed to issue a token.
#[derive(Clone)]
pub struct SigningKeys {
    /// Parsed private key
    pub encoding_key: EncodingKey,
    /// Public key PEM, returned verbatim to the caller
    pub public_key_pem: Vec<u8>,
}

/// Source of parsed key material.
///
/// Uses native async (no async-trait crate).
pub trait KeyProvider: Send + Sync {
    /// Private key for signing plus the raw public key.
    fn signing_keys(&self) -> impl Future<Output = Result<SigningKeys, TokenError>> + Send;

    /// Public key for verification.
    fn verifying_key(&self) -> impl Future<Output = Result<DecodingKey, TokenError>> + Send;
}

/// Reads key files from disk on every call.
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    private_key_path: PathBuf,
    public_key_path: PathBuf,
    read_timeout: Duration,
}

impl FileKeyProvider {
    /// Create a provider for the given PEM files.
    #[must_use]
    pub fn new(private_key_path: impl Into<PathBuf>, public_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
            read_timeout: Duration::from_secs(2),
        }
    }

    /// Bound each file read.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    async fn read_private(&self) -> Result<Zeroizing<Vec<u8>>, TokenError> {
        read_key_file(&self.private_key_path, self.read_timeout)
            .await
            .map(Zeroizing::new)
    }

    async fn read_public(&self) -> Result<Vec<u8>, TokenError> {
        read_key_file(&self.public_key_path, self.read_timeout).await
    }
}

impl KeyProvider for FileKeyProvider {
    async fn signing_keys(&self) -> Result<SigningKeys, TokenError> {
        let private_pem = self.read_private().await?;
        let public_key_pem = self.read_public().await?;
        let encoding_key = parse_private_key(&self.private_key_path, &private_pem)?;

        Ok(SigningKeys {
            encoding_key,
            public_key_pem,
        })
    }

    async fn verifying_key(&self) -> Result<DecodingKey, TokenError> {
        let public_pem = self.read_public().await?;
        parse_public_key(&self.public_key_path, &public_pem)
    }
}

/// Keys parsed once and held for the life of the process.
#[derive(Clone)]
pub struct StaticKeyProvider {
    signing: SigningKeys,
    decoding_key: DecodingKey,
}

impl StaticKeyProvider {
    /// Read and parse both key files.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyMaterial`] if either file is unreadable or
    /// malformed.
    pub async fn load(files: &FileKeyProvider) -> Result<Self, TokenError> {
        let signing = files.signing_keys().await?;
        let decoding_key = parse_public_key(&files.public_key_path, &signing.public_key_pem)?;

        info!(
            private_key = %files.private_key_path.display(),
            public_key = %files.public_key_path.display(),
            "Preloaded key material"
        );

        Ok(Self {
            signing,
            decoding_key,
        })
    }
}

impl KeyProvider for StaticKeyProvider {
    async fn signing_keys(&self) -> Result<SigningKeys, TokenError> {
        Ok(self.signing.clone())
    }

    async fn verifying_key(&self) -> Result<DecodingKey, TokenError> {
        Ok(self.decoding_key.clone())
    }
}

/// Key provider selected by configuration.
#[derive(Clone)]
pub enum KeySource {
    /// Re-read on every request
    File(FileKeyProvider),
    /// Loaded once at startup
    Static(StaticKeyProvider),
}

impl KeySource {
    /// Build the provider described by `config`.
    ///
    /// # Errors
    ///
    /// With `key_preload` set, fails if the keys cannot be loaded now.
    pub async fn from_config(config: &Config) -> Result<Self, TokenError> {
        let files = FileKeyProvider::new(&config.private_key_path, &config.public_key_path)
            .with_read_timeout(config.key_read_timeout);

        if config.key_preload {
            Ok(Self::Static(StaticKeyProvider::load(&files).await?))
        } else {
            Ok(Self::File(files))
        }
    }
}

impl KeyProvider for KeySource {
    async fn signing_keys(&self) -> Result<SigningKeys, TokenError> {
        match self {
            Self::File(provider) => provider.signing_keys().await,
            Self::Static(provider) => provider.signing_keys().await,
        }
    }

    async fn verifying_key(&self) -> Result<DecodingKey, TokenError> {
        match self {
            Self::File(provider) => provider.verifying_key().await,
            Self::Static(provider) => provider.verifying_key().await,
        }
    }
}

async fn read_key_file(path: &Path, timeout: Duration) -> Result<Vec<u8>, TokenError> {
    match tokio::time::timeout(timeout, tokio::fs::read(path)).await {
        Ok(Ok(bytes)) => {
            debug!(path = %path.display(), len = bytes.len(), "Read key file");
            Ok(bytes)
        }
        Ok(Err(e)) => Err(TokenError::key_material(path, e.to_string())),
        Err(_) => Err(TokenError::key_material(
            path,
            format!("read timed out after {timeout:?}"),
        )),
    }
}

fn parse_private_key(path: &Path, pem: &[u8]) -> Result<EncodingKey, TokenError> {
    EncodingKey::from_rsa_pem(pem).map_err(|e| TokenError::key_material(path, e.to_string()))
}

fn parse_public_key(path: &Path, pem: &[u8]) -> Result<DecodingKey, TokenError> {
    DecodingKey::from_rsa_pem(pem).map_err(|e| TokenError::key_material(path, e.to_string()))
}
