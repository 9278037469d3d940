use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use super::{mean, round2, MetricRecord};

// ─── Configuration ───────────────────────────────────────────────

/// Time-series resolution (one point per 5-minute window)
pub const BUCKET_WIDTH_MS: i64 = 5 * 60 * 1000;

// ─── Public types ────────────────────────────────────────────────

/// One point on the traffic chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    /// Wall-clock `HH:MM` of the window start
    pub time: String,
    pub requests: u64,
    pub avg_response_time: f64,
    pub errors: u64,
}

/// Running totals for one window while the batch is scanned.
#[derive(Default)]
struct BucketAccumulator {
    requests: u64,
    latency_sum: f64,
    errors: u64,
}

// ─── Aggregation ─────────────────────────────────────────────────

/// Bucket the batch into 5-minute windows labelled in the host's local time.
pub fn time_series(records: &[MetricRecord]) -> Vec<TimeBucket> {
    time_series_in(records, &Local)
}

/// Same as [`time_series`] with an explicit time zone for the labels.
///
/// Windows are keyed by label, so two records exactly a day apart land in
/// the same bucket. Output is sorted by label; only windows that saw at
/// least one record appear.
pub fn time_series_in<Tz>(records: &[MetricRecord], tz: &Tz) -> Vec<TimeBucket>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut buckets: BTreeMap<String, BucketAccumulator> = BTreeMap::new();

    for record in records {
        let acc = buckets.entry(bucket_label(record.timestamp, tz)).or_default();
        acc.requests += 1;
        acc.latency_sum += record.response_time_ms;
        if record.is_error() {
            acc.errors += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(time, acc)| TimeBucket {
            time,
            requests: acc.requests,
            avg_response_time: round2(mean(acc.latency_sum, acc.requests)),
            errors: acc.errors,
        })
        .collect()
}

/// Floor `timestamp_ms` to its window start and format it as `HH:MM`.
pub fn bucket_label<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // Out-of-range timestamps fall back to the epoch rather than failing
    let utc = timestamp_ms
        .div_euclid(BUCKET_WIDTH_MS)
        .checked_mul(BUCKET_WIDTH_MS)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();
    utc.with_timezone(tz).format("%H:%M").to_string()
}
