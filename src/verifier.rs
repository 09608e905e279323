//! Identity token verification.

use crate::blocking::run_bounded;
use crate::error::TokenError;
use crate::jwt::{Claims, JwtSerializer};
use crate::keys::KeyProvider;
use crate::metrics::ServiceMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Validates caller-presented tokens and recovers their subject.
pub struct TokenVerifier<K> {
    keys: Arc<K>,
    metrics: Arc<ServiceMetrics>,
    serializer: JwtSerializer,
    crypto_timeout: Duration,
}

impl<K: KeyProvider> TokenVerifier<K> {
    /// Create a verifier with a two second crypto bound.
    #[must_use]
    pub fn new(keys: Arc<K>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            keys,
            metrics,
            serializer: JwtSerializer::rs256(),
            crypto_timeout: Duration::from_secs(2),
        }
    }

    /// Bound the signature check.
    #[must_use]
    pub const fn with_crypto_timeout(mut self, timeout: Duration) -> Self {
        self.crypto_timeout = timeout;
        self
    }

    /// Verify `token` and return its subject.
    ///
    /// An absent or empty token fails with [`TokenError::TokenMissing`]
    /// before any key material is read. Bad signatures, malformed tokens,
    /// foreign algorithms and expired tokens all fail with
    /// [`TokenError::TokenInvalid`]. Only successes are timed.
    ///
    /// # Errors
    ///
    /// See above; key loading problems surface as
    /// [`TokenError::KeyMaterial`].
    pub async fn verify(&self, token: Option<&str>) -> Result<String, TokenError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.metrics.record_verification_failure(crate::error::TOKEN_MISSING);
            return Err(TokenError::TokenMissing);
        };

        let started = Instant::now();
        let claims = match self.check(token).await {
            Ok(claims) => claims,
            Err(err) => {
                if let TokenError::TokenInvalid(reason) = &err {
                    debug!(%reason, "Token verification failed");
                }
                self.metrics.record_verification_failure(err.code());
                return Err(err);
            }
        };

        let elapsed = started.elapsed();
        self.metrics.record_verification(elapsed);

        debug!(
            jti = %claims.jti,
            latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "Verified identity token"
        );

        Ok(claims.sub)
    }

    async fn check(&self, token: &str) -> Result<Claims, TokenError> {
        let decoding_key = self.keys.verifying_key().await?;

        let serializer = self.serializer.clone();
        let token = token.to_owned();
        run_bounded("verify", self.crypto_timeout, move || {
            serializer.deserialize(&token, &decoding_key)
        })
        .await
    }
}
