pub mod aggregate;
pub mod dashboard;
pub mod percentiles;
pub mod stream;
pub mod timeline;

pub use dashboard::{DashboardSnapshot, DashboardStore};

use serde::{Deserialize, Serialize};

/// One logged HTTP request, as delivered by the data source.
///
/// The wire shape is camelCase so it matches what the browser dashboard
/// already consumes. `id` and `ip` are optional on the wire; the source
/// layer re-identifies every record after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Opaque identity, unique within a batch once synthesized
    #[serde(default)]
    pub id: String,
    /// Origin address — informational only
    #[serde(default)]
    pub ip: String,
    /// HTTP verb, e.g. "GET"
    pub method: String,
    /// Request path, may carry placeholders such as `/api/users/:id`
    pub path: String,
    /// HTTP status code
    pub status: u16,
    /// Handler latency in milliseconds
    pub response_time_ms: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl MetricRecord {
    /// Anything at or above 400 counts against the error rate.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Round to two decimal places, the precision every derived ratio reports.
///
/// Rounds on the exact binary value, so `1.115` (really 1.11499...) gives
/// 1.11. Exact halves, which are odd multiples of 1/8, round away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return (value * 100.0).round() / 100.0;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

/// `sum / count`, or 0 when there is nothing to divide by.
pub(crate) fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}
