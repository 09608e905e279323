use serde::{Deserialize, Serialize};

/// Claim set carried by an identity token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject the token asserts
    pub sub: String,
    /// Expiration, Unix seconds
    pub exp: i64,
    /// Issued-at, Unix seconds
    #[serde(default)]
    pub iat: i64,
    /// Token identifier, only used to correlate log lines
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Claims for `subject` valid for `ttl_seconds` from now.
    pub fn new(subject: String, ttl_seconds: i64) -> Self {
        Self::issued_at(subject, chrono::Utc::now().timestamp(), ttl_seconds)
    }

    /// Claims for `subject` issued at the given Unix timestamp.
    pub fn issued_at(subject: String, now: i64, ttl_seconds: i64) -> Self {
        Claims {
            sub: subject,
            exp: now.saturating_add(ttl_seconds),
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// A token is rejected at its expiration instant, not one second later.
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        timestamp < self.exp
    }
}
