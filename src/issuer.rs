//! Identity token issuance.

use crate::blocking::run_bounded;
use crate::error::TokenError;
use crate::jwt::{JwtBuilder, JwtSerializer, builder::DEFAULT_TTL_SECONDS};
use crate::keys::KeyProvider;
use crate::metrics::ServiceMetrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact RS256 JWT
    pub token: String,
    /// Public key PEM matching the signing key
    pub public_key_pem: Vec<u8>,
    /// Token identifier, for log correlation
    pub jti: String,
    /// Instant at which the token stops verifying
    pub expires_at: DateTime<Utc>,
}

/// Mints signed tokens asserting a subject.
pub struct TokenIssuer<K> {
    keys: Arc<K>,
    metrics: Arc<ServiceMetrics>,
    serializer: JwtSerializer,
    ttl_seconds: i64,
    crypto_timeout: Duration,
}

impl<K: KeyProvider> TokenIssuer<K> {
    /// Issuer with a one-day TTL.
    #[must_use]
    pub fn new(keys: Arc<K>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            keys,
            metrics,
            serializer: JwtSerializer::rs256(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            crypto_timeout: Duration::from_secs(2),
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub const fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Bound the signing step.
    #[must_use]
    pub const fn with_crypto_timeout(mut self, timeout: Duration) -> Self {
        self.crypto_timeout = timeout;
        self
    }

    /// Issue a token for `subject`.
    ///
    /// The subject is taken verbatim. The recorded latency covers the key
    /// read, the key parse and the signature.
    ///
    /// # Errors
    ///
    /// [`TokenError::KeyMaterial`] when the keys cannot be loaded,
    /// [`TokenError::JwtEncoding`] or [`TokenError::Timeout`] when signing
    /// fails.
    pub async fn issue(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        let started = Instant::now();

        let keys = self.keys.signing_keys().await?;
        let claims = JwtBuilder::new()
            .subject(subject)
            .ttl_seconds(self.ttl_seconds)
            .build()
            .map_err(TokenError::internal)?;

        let serializer = self.serializer.clone();
        let encoding_key = keys.encoding_key;
        let to_sign = claims.clone();
        let token = run_bounded("sign", self.crypto_timeout, move || {
            serializer.serialize(&to_sign, &encoding_key)
        })
        .await?;

        let elapsed = started.elapsed();
        self.metrics.record_issuance(elapsed);

        info!(
            jti = %claims.jti,
            exp = claims.exp,
            latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "Issued identity token"
        );

        Ok(IssuedToken {
            token,
            public_key_pem: keys.public_key_pem,
            jti: claims.jti,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }
}
