use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::{self, EndpointStat, MethodStat, StatusGroup, Summary};
use super::percentiles::PercentileSet;
use super::timeline::{self, TimeBucket};
use super::MetricRecord;

// ─── Public types ────────────────────────────────────────────────

/// Every derived view for one batch, built in a single pass over the
/// aggregators and published as a unit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub cycle_id: Uuid,
    /// Epoch milliseconds at which the batch was aggregated
    pub generated_at_ms: i64,
    pub summary: Summary,
    pub latency: PercentileSet,
    pub time_series: Vec<TimeBucket>,
    pub status_codes: Vec<StatusGroup>,
    pub endpoints: Vec<EndpointStat>,
    pub methods: Vec<MethodStat>,
}

impl DashboardSnapshot {
    /// Run every aggregator over `records`.
    pub fn build(records: &[MetricRecord], generated_at_ms: i64) -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            generated_at_ms,
            summary: aggregate::summary(records),
            latency: PercentileSet::from_records(records),
            time_series: timeline::time_series(records),
            status_codes: aggregate::status_groups(records),
            endpoints: aggregate::top_endpoints(records),
            methods: aggregate::method_stats(records),
        }
    }
}

/// Outcome bookkeeping for the refresh cycles so far.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub successes: u64,
    pub failures: u64,
    pub last_attempt_ms: Option<i64>,
    pub last_success_ms: Option<i64>,
    /// Message of the most recent failure, cleared by the next success
    pub last_error: Option<String>,
}

/// Thread-safe home of the latest derived views.
/// The refresh controller publishes, HTTP handlers read.
pub struct DashboardStore {
    inner: RwLock<Inner>,
}

// ─── Internal state ──────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    // Batch and snapshot are always replaced together
    records: Arc<Vec<MetricRecord>>,
    snapshot: Option<Arc<DashboardSnapshot>>,
    status: RefreshStatus,
}

// ─── DashboardStore impl ─────────────────────────────────────────

impl DashboardStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Replace the batch and every derived view in one swap.
    ///
    /// A snapshot older than the one already held is dropped and the held
    /// one is returned instead, so the views never move backwards in time.
    pub fn publish(&self, records: Vec<MetricRecord>, snapshot: DashboardSnapshot) -> Arc<DashboardSnapshot> {
        let at = snapshot.generated_at_ms;
        let mut inner = self.inner.write();
        if let Some(held) = inner.snapshot.as_ref().filter(|held| held.generated_at_ms > at) {
            tracing::debug!(stale_ms = at, held_ms = held.generated_at_ms, "dropping stale snapshot");
            return held.clone();
        }

        let snapshot = Arc::new(snapshot);
        inner.records = Arc::new(records);
        inner.snapshot = Some(snapshot.clone());
        inner.status.successes += 1;
        inner.status.last_attempt_ms = Some(at);
        inner.status.last_success_ms = Some(at);
        inner.status.last_error = None;
        snapshot
    }

    /// Note a failed cycle. Whatever was published before stays visible.
    pub fn record_failure(&self, error: &str, at_ms: i64) {
        let mut inner = self.inner.write();
        inner.status.failures += 1;
        inner.status.last_attempt_ms = Some(at_ms);
        inner.status.last_error = Some(error.to_owned());
    }

    /// Latest snapshot, or `None` before the first successful cycle.
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.inner.read().snapshot.clone()
    }

    /// The raw batch behind the latest snapshot.
    pub fn records(&self) -> Arc<Vec<MetricRecord>> {
        self.inner.read().records.clone()
    }

    pub fn status(&self) -> RefreshStatus {
        self.inner.read().status.clone()
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::record;

    #[test]
    fn build_runs_every_aggregator() {
        let batch = vec![
            record("GET", "/a", 200, 100.0, 0),
            record("GET", "/a", 500, 3000.0, 0),
        ];
        let snapshot = DashboardSnapshot::build(&batch, 42);

        assert_eq!(snapshot.generated_at_ms, 42);
        assert_eq!(snapshot.summary.total_requests, 2);
        assert_eq!(snapshot.latency.count, 2);
        assert_eq!(snapshot.time_series.len(), 1);
        assert_eq!(snapshot.status_codes.len(), 2);
        assert_eq!(snapshot.endpoints.len(), 1);
        assert_eq!(snapshot.methods.len(), 1);
    }

    #[test]
    fn snapshot_serializes_with_camel_case_names() {
        let snapshot = DashboardSnapshot::build(&[record("GET", "/", 200, 1.0, 0)], 0);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json.get("timeSeries").is_some());
        assert!(json.get("statusCodes").is_some());
        assert_eq!(json["summary"]["totalRequests"], 1);
        assert_eq!(json["endpoints"][0]["avgResponseTime"], 1.0);
    }

    #[test]
    fn failure_keeps_previous_views() {
        let store = DashboardStore::new();
        assert!(store.snapshot().is_none());

        let batch = vec![record("GET", "/", 200, 5.0, 0)];
        let snapshot = DashboardSnapshot::build(&batch, 10);
        let cycle = snapshot.cycle_id;
        store.publish(batch, snapshot);

        store.record_failure("upstream returned 503", 20);

        let kept = store.snapshot().unwrap();
        assert_eq!(kept.cycle_id, cycle);
        assert_eq!(store.records().len(), 1);

        let status = store.status();
        assert_eq!(status.successes, 1);
        assert_eq!(status.failures, 1);
        assert_eq!(status.last_success_ms, Some(10));
        assert_eq!(status.last_attempt_ms, Some(20));
        assert_eq!(status.last_error.as_deref(), Some("upstream returned 503"));
    }

    #[test]
    fn older_snapshot_does_not_replace_newer_one() {
        let store = DashboardStore::new();

        let newer = vec![record("GET", "/new", 200, 5.0, 0), record("GET", "/new", 200, 5.0, 0)];
        let kept = store.publish(newer.clone(), DashboardSnapshot::build(&newer, 200));

        let older = vec![record("GET", "/old", 200, 5.0, 0)];
        let returned = store.publish(older.clone(), DashboardSnapshot::build(&older, 100));

        assert_eq!(returned.cycle_id, kept.cycle_id);
        assert_eq!(store.snapshot().unwrap().cycle_id, kept.cycle_id);
        assert_eq!(store.records().as_slice(), newer.as_slice());

        let status = store.status();
        assert_eq!(status.successes, 1);
        assert_eq!(status.last_success_ms, Some(200));
    }

    #[test]
    fn publish_replaces_everything_and_clears_error() {
        let store = DashboardStore::new();
        store.record_failure("boom", 1);

        let first = vec![record("GET", "/", 200, 5.0, 0), record("GET", "/", 200, 5.0, 0)];
        store.publish(first.clone(), DashboardSnapshot::build(&first, 2));

        let second = vec![record("POST", "/b", 201, 7.0, 0)];
        store.publish(second.clone(), DashboardSnapshot::build(&second, 3));

        assert_eq!(store.records().as_slice(), second.as_slice());
        assert_eq!(store.snapshot().unwrap().summary.total_requests, 1);
        assert!(store.status().last_error.is_none());
    }
}
