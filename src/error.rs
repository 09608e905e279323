//! Error types for token issuance and verification.
//!
//! Three families matter to callers: a missing credential (client error),
//! an invalid credential (authentication error) and everything else, which
//! is reported as an internal error scoped to the failing request.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Errors produced by the token core and the HTTP boundary.
#[derive(Error, Debug)]
pub enum TokenError {
    /// No token cookie was presented.
    #[error("Token missing from request")]
    TokenMissing,

    /// Signature mismatch, malformed structure, wrong algorithm or expiry.
    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// Key file missing, unreadable, malformed or too slow to read.
    #[error("Key material error for {path}: {reason}")]
    KeyMaterial {
        /// Path of the offending key file
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Signing the claim set failed.
    #[error("JWT encoding error: {0}")]
    JwtEncoding(String),

    /// A cryptographic step exceeded its time bound.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// Name of the bounded operation
        operation: &'static str,
        /// The bound that was exceeded
        duration: Duration,
    },

    /// A static file could not be served.
    #[error("Static file error for {path}: {reason}")]
    Static {
        /// Path of the file
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Create a key material error for the given path.
    #[must_use]
    pub fn key_material(path: &Path, reason: impl Into<String>) -> Self {
        Self::KeyMaterial {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid token error with the given reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::TokenInvalid(reason.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TokenMissing => TOKEN_MISSING,
            Self::TokenInvalid(_) => TOKEN_INVALID,
            _ => INTERNAL_ERROR,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::TokenMissing => StatusCode::BAD_REQUEST,
            Self::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Internal errors never leak paths or key details.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::TokenMissing => "Token is required",
            Self::TokenInvalid(_) => "Token is invalid or expired",
            _ => "Internal server error",
        }
    }

    /// Whether the failure was caused by the caller's credential.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::TokenMissing | Self::TokenInvalid(_))
    }
}

// Error codes for HTTP responses
/// No token cookie was presented.
pub const TOKEN_MISSING: &str = "TOKEN_MISSING";
/// The presented token failed verification.
pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
/// Any server-side failure.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!(code = self.code(), "Request rejected");
        } else {
            error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
