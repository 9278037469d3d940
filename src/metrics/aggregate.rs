//! Pure aggregators over one batch of [`MetricRecord`]s.
//!
//! Every function here takes the full batch, allocates a fresh result and
//! touches no shared state. Ratios over an empty group are reported as 0.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{mean, round2, MetricRecord};

// ─── Configuration ───────────────────────────────────────────────

/// Only the busiest endpoints make it into the table.
pub const TOP_ENDPOINTS: usize = 10;

/// Fallback for any status class or verb without a palette entry.
pub const NEUTRAL_COLOR: &str = "#6b7280";

const MS_PER_MINUTE: f64 = 60_000.0;

// ─── Public types ────────────────────────────────────────────────

/// Headline numbers for the stat cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_requests: u64,
    pub avg_response_time: f64,
    /// Percentage (0–100) of requests with status ≥ 400
    pub error_rate: f64,
    pub requests_per_minute: f64,
}

/// Request count for one status class ("2xx", "3xx", ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusGroup {
    pub status: String,
    pub count: u64,
    pub color: &'static str,
}

/// Traffic for one exact (method, path) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStat {
    pub path: String,
    pub method: String,
    pub count: u64,
    pub avg_response_time: f64,
}

/// Request count for one HTTP verb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodStat {
    pub method: String,
    pub count: u64,
    pub color: &'static str,
}

// ─── Summary ─────────────────────────────────────────────────────

/// Total, mean latency, error rate and requests per minute.
///
/// The rate is taken over the span between the earliest and latest
/// timestamp; a zero span (one record, or all at the same instant)
/// yields 0 rather than infinity.
pub fn summary(records: &[MetricRecord]) -> Summary {
    let total = records.len() as u64;
    if total == 0 {
        return Summary::default();
    }

    let latency_sum: f64 = records.iter().map(|r| r.response_time_ms).sum();
    let errors = records.iter().filter(|r| r.is_error()).count() as u64;

    let min_ts = records.iter().map(|r| r.timestamp).min().unwrap_or(0);
    let max_ts = records.iter().map(|r| r.timestamp).max().unwrap_or(0);
    let span_minutes = max_ts.saturating_sub(min_ts) as f64 / MS_PER_MINUTE;

    let rpm = if span_minutes > 0.0 {
        total as f64 / span_minutes
    } else {
        0.0
    };

    Summary {
        total_requests: total,
        avg_response_time: round2(mean(latency_sum, total)),
        error_rate: round2(errors as f64 / total as f64 * 100.0),
        requests_per_minute: round2(rpm),
    }
}

// ─── Status classes ──────────────────────────────────────────────

/// Label for the hundreds digit of a status code, e.g. 404 → "4xx".
pub fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

fn status_color(class: &str) -> &'static str {
    match class {
        "2xx" => "#10b981",
        "3xx" => "#3b82f6",
        "4xx" => "#f59e0b",
        "5xx" => "#ef4444",
        _ => NEUTRAL_COLOR,
    }
}

/// One entry per status class present in the batch, sorted by label.
pub fn status_groups(records: &[MetricRecord]) -> Vec<StatusGroup> {
    // BTreeMap keeps the labels ordered for free
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(status_class(record.status)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(status, count)| StatusGroup {
            color: status_color(&status),
            status,
            count,
        })
        .collect()
}

// ─── Endpoints ───────────────────────────────────────────────────

#[derive(Default)]
struct EndpointAccumulator {
    count: u64,
    latency_sum: f64,
}

/// The [`TOP_ENDPOINTS`] busiest (method, path) pairs.
///
/// Paths are grouped verbatim, placeholders included. Ties on count are
/// ordered by method, then path.
pub fn top_endpoints(records: &[MetricRecord]) -> Vec<EndpointStat> {
    let mut groups: BTreeMap<(&str, &str), EndpointAccumulator> = BTreeMap::new();
    for record in records {
        let acc = groups
            .entry((record.method.as_str(), record.path.as_str()))
            .or_default();
        acc.count += 1;
        acc.latency_sum += record.response_time_ms;
    }

    let mut stats: Vec<EndpointStat> = groups
        .into_iter()
        .map(|((method, path), acc)| EndpointStat {
            path: path.to_owned(),
            method: method.to_owned(),
            count: acc.count,
            avg_response_time: round2(mean(acc.latency_sum, acc.count)),
        })
        .collect();

    // Stable sort: equal counts keep the (method, path) order of the map
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(TOP_ENDPOINTS);
    stats
}

// ─── Methods ─────────────────────────────────────────────────────

fn method_color(method: &str) -> &'static str {
    match method {
        "GET" => "#3b82f6",
        "POST" => "#10b981",
        "PUT" => "#f59e0b",
        "DELETE" => "#ef4444",
        "PATCH" => "#8b5cf6",
        _ => NEUTRAL_COLOR,
    }
}

/// Every verb in the batch, busiest first (ties by name).
pub fn method_stats(records: &[MetricRecord]) -> Vec<MethodStat> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.method.as_str()).or_default() += 1;
    }

    let mut stats: Vec<MethodStat> = counts
        .into_iter()
        .map(|(method, count)| MethodStat {
            method: method.to_owned(),
            count,
            color: method_color(method),
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}
