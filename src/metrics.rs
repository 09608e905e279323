//! Operation counts and latency averages.
//!
//! Each operation type owns a [`LatencyCell`]: a mutex over the pair
//! `(count, total_micros)`. A recording updates both under one lock and a
//! snapshot reads both under one lock, so a reported average always matches
//! its count. The issuance and verification cells are locked independently,
//! so a single [`StatsReport`] may observe them at slightly different
//! moments.
//!
//! Recordings are mirrored into the Prometheus default registry.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use prometheus::{
    Counter, CounterVec, HistogramVec, register_counter, register_counter_vec,
    register_histogram_vec,
};
use serde::Serialize;
use std::time::Duration;

/// Tokens issued counter.
static TOKENS_ISSUED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "identity_tokens_issued_total",
        "Total number of identity tokens issued"
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token verifications counter.
static TOKENS_VERIFIED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "identity_tokens_verified_total",
        "Total number of identity token verifications",
        &["status"]
    )
    .expect("Failed to register tokens_verified metric")
});

/// Operation latency histogram.
static OPERATION_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "identity_operation_latency_seconds",
        "Issue and verify latency in seconds",
        &["operation"],
        vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register operation_latency metric")
});

/// Shown instead of an average when nothing was recorded.
pub const NOT_APPLICABLE: &str = "n/a";

/// Consistent view of one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySnapshot {
    /// Successful operations
    pub count: u64,
    /// Sum of their latencies in microseconds
    pub total_micros: u64,
}

impl LatencySnapshot {
    /// Truncating average, `None` before the first operation.
    #[must_use]
    pub const fn average_micros(&self) -> Option<u64> {
        self.total_micros.checked_div(self.count)
    }

    fn count_display(&self) -> String {
        self.count.to_string()
    }

    fn average_display(&self) -> String {
        self.average_micros()
            .map_or_else(|| NOT_APPLICABLE.to_string(), |avg| format!("{avg}μs"))
    }
}

/// Counter with cumulative latency.
#[derive(Debug, Default)]
pub struct LatencyCell {
    inner: Mutex<LatencySnapshot>,
}

impl LatencyCell {
    /// Count one operation that took `latency`.
    pub fn record(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        let mut state = self.inner.lock();
        state.count += 1;
        state.total_micros = state.total_micros.saturating_add(micros);
    }

    /// Read count and total together.
    #[must_use]
    pub fn snapshot(&self) -> LatencySnapshot {
        *self.inner.lock()
    }
}

/// Body of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// Successful verifications, `"0"` when none
    pub number_of_verifications: String,
    /// Average verification latency, `"n/a"` when none
    pub average_of_verifications: String,
    /// Successful issuances, `"0"` when none
    pub number_of_authorizations: String,
    /// Average issuance latency, `"n/a"` when none
    pub average_of_authorizations: String,
}

/// Process-wide metrics shared by the issuer and the verifier.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    issuance: LatencyCell,
    verification: LatencyCell,
}

impl ServiceMetrics {
    /// Create zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        // Initialize lazy statics
        Lazy::force(&TOKENS_ISSUED);
        Lazy::force(&TOKENS_VERIFIED);
        Lazy::force(&OPERATION_LATENCY);
        Self::default()
    }

    /// Record a successful issuance.
    pub fn record_issuance(&self, latency: Duration) {
        self.issuance.record(latency);
        TOKENS_ISSUED.inc();
        OPERATION_LATENCY
            .with_label_values(&["issue"])
            .observe(latency.as_secs_f64());
    }

    /// Record a successful verification.
    pub fn record_verification(&self, latency: Duration) {
        self.verification.record(latency);
        TOKENS_VERIFIED.with_label_values(&["success"]).inc();
        OPERATION_LATENCY
            .with_label_values(&["verify"])
            .observe(latency.as_secs_f64());
    }

    /// Record a rejected verification. Does not touch the averages.
    pub fn record_verification_failure(&self, code: &str) {
        TOKENS_VERIFIED.with_label_values(&[code]).inc();
    }

    /// Current issuance count and total.
    #[must_use]
    pub fn issuance(&self) -> LatencySnapshot {
        self.issuance.snapshot()
    }

    /// Current verification count and total.
    #[must_use]
    pub fn verification(&self) -> LatencySnapshot {
        self.verification.snapshot()
    }

    /// Counts and averages for both operation types.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        let issuance = self.issuance();
        let verification = self.verification();

        StatsReport {
            number_of_verifications: verification.count_display(),
            average_of_verifications: verification.average_display(),
            number_of_authorizations: issuance.count_display(),
            average_of_authorizations: issuance.average_display(),
        }
    }
}

/// Render the default registry in the Prometheus text format.
///
/// # Errors
///
/// Returns the encoder's error if a metric family cannot be encoded.
pub fn export_prometheus() -> Result<String, prometheus::Error> {
    prometheus::TextEncoder::new().encode_to_string(&prometheus::gather())
}

/// Failed verifications recorded so far under `code`.
#[cfg(test)]
pub(crate) fn verification_failures(code: &str) -> f64 {
    TOKENS_VERIFIED.with_label_values(&[code]).get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let metrics = ServiceMetrics::new();
        let report = metrics.report();

        assert_eq!(report.number_of_authorizations, "0");
        assert_eq!(report.average_of_authorizations, NOT_APPLICABLE);
        assert_eq!(report.number_of_verifications, "0");
        assert_eq!(report.average_of_verifications, NOT_APPLICABLE);
    }

    #[test]
    fn test_average_truncates() {
        let metrics = ServiceMetrics::new();
        metrics.record_issuance(Duration::from_micros(10));
        metrics.record_issuance(Duration::from_micros(11));

        let report = metrics.report();
        assert_eq!(report.number_of_authorizations, "2");
        assert_eq!(report.average_of_authorizations, "10μs");
        assert_eq!(report.number_of_verifications, "0");
    }

    #[test]
    fn test_sub_microsecond_latency_counts_as_zero() {
        let cell = LatencyCell::default();
        cell.record(Duration::from_nanos(999));

        assert_eq!(
            cell.snapshot(),
            LatencySnapshot {
                count: 1,
                total_micros: 0
            }
        );
        assert_eq!(cell.snapshot().average_micros(), Some(0));
    }

    #[test]
    fn test_failures_do_not_move_averages() {
        let metrics = ServiceMetrics::new();
        metrics.record_verification(Duration::from_micros(40));
        metrics.record_verification_failure("TOKEN_INVALID");

        assert_eq!(metrics.verification().count, 1);
        assert_eq!(metrics.report().average_of_verifications, "40μs");
        assert!(verification_failures("TOKEN_INVALID") >= 1.0);
    }

    #[test]
    fn test_report_json_field_names() {
        let json = serde_json::to_value(ServiceMetrics::new().report()).unwrap();
        for field in [
            "numberOfVerifications",
            "averageOfVerifications",
            "numberOfAuthorizations",
            "averageOfAuthorizations",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_prometheus_export_contains_counters() {
        let metrics = ServiceMetrics::new();
        metrics.record_issuance(Duration::from_millis(1));

        let text = export_prometheus().unwrap();
        assert!(text.contains("identity_tokens_issued_total"));
    }
}
