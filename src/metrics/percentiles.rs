use hdrhistogram::Histogram;
use serde::Serialize;

use super::{round2, MetricRecord};

/// HdrHistogram range: 1 μs → 1 h, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 3_600_000_000;
const HIST_SIGFIG: u8 = 3;

/// Latency percentile breakdown for one batch, in milliseconds.
/// Serialized next to the summary cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: u64,
}

impl PercentileSet {
    /// Record every latency of the batch and extract the percentiles.
    /// Returns zeroed values for an empty batch.
    pub fn from_records(records: &[MetricRecord]) -> Self {
        let Ok(mut hist) = Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG) else {
            return Self::empty();
        };

        for record in records {
            // Clamp to the histogram range (≥ 1 μs, ≤ 1 h)
            let us = (record.response_time_ms * 1000.0).round();
            let us = if us.is_finite() { us as u64 } else { HIST_HIGH };
            hist.saturating_record(us.clamp(HIST_LOW, HIST_HIGH));
        }

        Self::from_histogram(&hist)
    }

    /// Extract a full percentile set from a microsecond HdrHistogram.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        let ms = |us: u64| round2(us as f64 / 1000.0);
        Self {
            min: ms(hist.min()),
            max: ms(hist.max()),
            mean: round2(hist.mean() / 1000.0),
            p50: ms(hist.value_at_percentile(50.0)),
            p95: ms(hist.value_at_percentile(95.0)),
            p99: ms(hist.value_at_percentile(99.0)),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used for an empty batch.
    pub fn empty() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            count: 0,
        }
    }
}
