use crate::jwt::claims::Claims;

/// Default token lifetime: one day.
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Assembles a [`Claims`] set for one subject.
pub struct JwtBuilder {
    subject: Option<String>,
    ttl_seconds: i64,
    issued_at: Option<i64>,
}

impl JwtBuilder {
    /// Builder with no subject and the default TTL.
    pub fn new() -> Self {
        JwtBuilder {
            subject: None,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            issued_at: None,
        }
    }

    /// Subject, stored as given.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Negative values produce an already expired claim set.
    pub fn ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = ttl;
        self
    }

    /// Pin the issuance instant instead of reading the clock.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    /// Fails when no subject was set.
    pub fn build(self) -> Result<Claims, &'static str> {
        let subject = self.subject.ok_or("Subject is required")?;

        Ok(match self.issued_at {
            Some(now) => Claims::issued_at(subject, now, self.ttl_seconds),
            None => Claims::new(subject, self.ttl_seconds),
        })
    }
}

impl Default for JwtBuilder {
    fn default() -> Self {
        Self::new()
    }
}
