//! Identity Token Service library.
//!
//! Issues RS256-signed identity tokens for a named subject and verifies
//! them with the matching public key, keeping running counts and average
//! latencies for both operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blocking;
pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod observability;
pub mod shutdown;
pub mod verifier;

// Re-exports for convenience
pub use config::Config;
pub use error::TokenError;
pub use issuer::{IssuedToken, TokenIssuer};
pub use keys::{FileKeyProvider, KeyProvider, KeySource, StaticKeyProvider};
pub use metrics::{ServiceMetrics, StatsReport};
pub use verifier::TokenVerifier;
