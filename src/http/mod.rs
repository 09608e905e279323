//! HTTP boundary.
//!
//! Maps the routes onto the issuer, the verifier and the metrics report.
//! The token travels between calls in the `token` cookie.

pub mod handlers;

use crate::config::Config;
use crate::issuer::TokenIssuer;
use crate::keys::KeySource;
use crate::metrics::ServiceMetrics;
use crate::verifier::TokenVerifier;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Name of the cookie carrying the token.
pub const TOKEN_COOKIE: &str = "token";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Token issuer
    pub issuer: Arc<TokenIssuer<KeySource>>,
    /// Token verifier
    pub verifier: Arc<TokenVerifier<KeySource>>,
    /// Process-wide metrics
    pub metrics: Arc<ServiceMetrics>,
    /// File served on `/README.txt`
    pub readme_path: Arc<PathBuf>,
    /// Mark the token cookie `Secure`
    pub cookie_secure: bool,
}

impl AppState {
    /// Wire the issuer and verifier to one key source and one metrics set.
    #[must_use]
    pub fn new(config: &Config, keys: KeySource) -> Self {
        let keys = Arc::new(keys);
        let metrics = Arc::new(ServiceMetrics::new());

        let issuer = TokenIssuer::new(keys.clone(), metrics.clone())
            .with_ttl_seconds(config.token_ttl_seconds())
            .with_crypto_timeout(config.crypto_timeout);
        let verifier = TokenVerifier::new(keys, metrics.clone())
            .with_crypto_timeout(config.crypto_timeout);

        Self {
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            metrics,
            readme_path: Arc::new(config.readme_path.clone()),
            cookie_secure: config.cookie_secure,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/auth/{user_name}", get(handlers::issue))
        .route("/verify", get(handlers::verify))
        .route("/stats", get(handlers::stats))
        .route("/README.txt", get(handlers::readme))
        .route("/metrics", get(handlers::metrics))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
