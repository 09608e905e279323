//! Shared fixtures for integration tests.

#![allow(dead_code)]

use identity_token_service::config::Config;
use identity_token_service::keys::FileKeyProvider;
use identity_token_service::metrics::ServiceMetrics;
use identity_token_service::{TokenIssuer, TokenVerifier};
use std::path::PathBuf;
use std::sync::Arc;

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).unwrap()
}

/// Key pair signed and verified by `private.pem` / `public.pem`.
pub fn matching_keys() -> Arc<FileKeyProvider> {
    Arc::new(FileKeyProvider::new(fixture("private.pem"), fixture("public.pem")))
}

/// Signs with `private.pem` but verifies with an unrelated public key.
pub fn mismatched_keys() -> Arc<FileKeyProvider> {
    Arc::new(FileKeyProvider::new(
        fixture("private.pem"),
        fixture("other_public.pem"),
    ))
}

pub fn issuer_and_verifier(
    keys: Arc<FileKeyProvider>,
) -> (
    TokenIssuer<FileKeyProvider>,
    TokenVerifier<FileKeyProvider>,
    Arc<ServiceMetrics>,
) {
    let metrics = Arc::new(ServiceMetrics::new());
    (
        TokenIssuer::new(keys.clone(), metrics.clone()),
        TokenVerifier::new(keys, metrics.clone()),
        metrics,
    )
}

/// Config pointing at the fixture keys and the repository README.
pub fn test_config() -> Config {
    Config {
        private_key_path: fixture("private.pem"),
        public_key_path: fixture("public.pem"),
        readme_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("README.txt"),
        cookie_secure: false,
        ..Config::default()
    }
}
