use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{ControllerError, FetchError};
use crate::metrics::{DashboardSnapshot, DashboardStore};
use crate::source::DataSource;

/// Periodic fetch → aggregate → publish loop with an explicit lifecycle.
///
/// Owned by the caller; nothing runs until [`RefreshController::start`].
pub struct RefreshController {
    source: Arc<dyn DataSource>,
    store: Arc<DashboardStore>,
    interval: Duration,
    task: Mutex<Option<RunningTask>>,
    // Held for a whole fetch → publish pass so cycles never overlap
    cycle_lock: Arc<Mutex<()>>,
}

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshController {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<DashboardStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval,
            task: Mutex::new(None),
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single cycle now. Failures are recorded in the store and
    /// returned; the previously published views are left alone.
    pub async fn refresh_once(&self) -> Result<Arc<DashboardSnapshot>, FetchError> {
        run_cycle(self.source.as_ref(), &self.store, &self.cycle_lock).await
    }

    /// Spawn the polling task. The first cycle runs immediately.
    pub async fn start(&self) -> Result<(), ControllerError> {
        let mut guard = self.task.lock().await;
        if guard.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return Err(ControllerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            self.source.clone(),
            self.store.clone(),
            self.interval,
            self.cycle_lock.clone(),
            stop_rx,
        ));

        tracing::info!(
            source = %self.source.describe(),
            interval_ms = self.interval.as_millis() as u64,
            "refresh controller started"
        );
        *guard = Some(RunningTask { stop_tx, handle });
        Ok(())
    }

    /// Signal the task and wait for it to exit.
    /// Returns `false` when nothing was running.
    pub async fn stop(&self) -> bool {
        let Some(task) = self.task.lock().await.take() else {
            return false;
        };

        let was_running = !task.handle.is_finished();
        // Receiver may already be gone if the task ended on its own
        let _ = task.stop_tx.send(true);
        if let Err(err) = task.handle.await {
            tracing::warn!(error = %err, "refresh task ended abnormally");
        }

        tracing::info!("refresh controller stopped");
        was_running
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }
}

// ─── Polling task ────────────────────────────────────────────────

async fn poll_loop(
    source: Arc<dyn DataSource>,
    store: Arc<DashboardStore>,
    period: Duration,
    cycle_lock: Arc<Mutex<()>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    // A slow fetch should not cause a burst of catch-up cycles
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Errors are already logged and recorded; the next tick retries
                let _ = run_cycle(source.as_ref(), &store, &cycle_lock).await;
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn run_cycle(
    source: &dyn DataSource,
    store: &DashboardStore,
    cycle_lock: &Mutex<()>,
) -> Result<Arc<DashboardSnapshot>, FetchError> {
    let _cycle = cycle_lock.lock().await;
    let now = chrono::Utc::now().timestamp_millis();

    match source.fetch().await {
        Ok(records) => {
            // Aggregate outside the store lock, then swap in one go
            let snapshot = DashboardSnapshot::build(&records, now);
            tracing::debug!(
                records = records.len(),
                cycle = %snapshot.cycle_id,
                "refresh cycle complete"
            );
            Ok(store.publish(records, snapshot))
        }
        Err(err) => {
            tracing::warn!(error = %err, "refresh cycle failed");
            store.record_failure(&err.to_string(), now);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::record;
    use crate::metrics::MetricRecord;
    use crate::source::MockSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds for the first `fail_after` calls, then answers 502 forever.
    struct ScriptedSource {
        calls: AtomicUsize,
        fail_after: usize,
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<MetricRecord>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_after {
                return Err(FetchError::Status(502));
            }
            Ok(vec![record("GET", "/a", 200, 10.0, call as i64)])
        }

        fn describe(&self) -> String {
            "scripted".into()
        }
    }

    fn controller(source: Arc<dyn DataSource>, interval: Duration) -> (RefreshController, Arc<DashboardStore>) {
        let store = Arc::new(DashboardStore::new());
        (RefreshController::new(source, store.clone(), interval), store)
    }

    #[tokio::test]
    async fn refresh_once_publishes_a_snapshot() {
        let (ctl, store) = controller(Arc::new(MockSource::new(42, 100)), Duration::from_secs(5));

        let snapshot = ctl.refresh_once().await.unwrap();

        assert_eq!(snapshot.summary.total_requests, 100);
        assert_eq!(store.records().len(), 100);
        assert_eq!(store.status().successes, 1);
    }

    #[tokio::test]
    async fn failed_cycle_keeps_previous_snapshot() {
        let source = Arc::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            fail_after: 1,
        });
        let (ctl, store) = controller(source, Duration::from_secs(5));

        let first = ctl.refresh_once().await.unwrap();
        let err = ctl.refresh_once().await.unwrap_err();

        assert!(matches!(err, FetchError::Status(502)));
        assert_eq!(store.snapshot().unwrap().cycle_id, first.cycle_id);
        let status = store.status();
        assert_eq!(status.failures, 1);
        assert_eq!(status.last_error.as_deref(), Some("metrics source returned HTTP 502"));
    }

    /// First call is slow and returns one record; later calls answer at once with two.
    struct SlowFirstSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for SlowFirstSource {
        async fn fetch(&self) -> Result<Vec<MetricRecord>, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
                return Ok(vec![record("GET", "/old", 200, 1.0, 0)]);
            }
            Ok(vec![record("GET", "/new", 200, 1.0, 0), record("GET", "/new", 200, 1.0, 0)])
        }

        fn describe(&self) -> String {
            "slow-first".into()
        }
    }

    #[tokio::test]
    async fn overlapping_refreshes_never_publish_an_older_batch() {
        let (ctl, store) = controller(
            Arc::new(SlowFirstSource {
                calls: AtomicUsize::new(0),
            }),
            Duration::from_secs(60),
        );

        let (slow, fast) = tokio::join!(ctl.refresh_once(), async {
            // Let the slow cycle get going first
            tokio::time::sleep(Duration::from_millis(20)).await;
            ctl.refresh_once().await
        });
        let (slow, fast) = (slow.unwrap(), fast.unwrap());

        assert!(fast.generated_at_ms >= slow.generated_at_ms);
        let held = store.snapshot().unwrap();
        assert_eq!(held.cycle_id, fast.cycle_id);
        assert_eq!(store.records().len(), 2);
        assert_eq!(store.status().last_success_ms, Some(fast.generated_at_ms));
    }

    #[tokio::test]
    async fn start_twice_is_rejected_and_stop_is_idempotent() {
        let (ctl, _store) = controller(Arc::new(MockSource::new(1, 10)), Duration::from_secs(60));

        assert!(!ctl.stop().await);
        ctl.start().await.unwrap();
        assert!(ctl.is_running().await);
        assert!(matches!(ctl.start().await, Err(ControllerError::AlreadyRunning)));

        assert!(ctl.stop().await);
        assert!(!ctl.is_running().await);
        assert!(!ctl.stop().await);
    }

    #[tokio::test]
    async fn polling_refreshes_on_every_tick() {
        let source = Arc::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            fail_after: usize::MAX,
        });
        let (ctl, store) = controller(source.clone(), Duration::from_millis(20));

        ctl.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        ctl.stop().await;

        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected several cycles, got {calls}");
        assert_eq!(store.status().successes as usize, calls);

        // No further cycles once stopped
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn controller_can_restart_after_stop() {
        let (ctl, store) = controller(Arc::new(MockSource::new(3, 5)), Duration::from_secs(60));

        ctl.start().await.unwrap();
        ctl.stop().await;
        ctl.start().await.unwrap();
        ctl.stop().await;

        // Each start runs one immediate cycle; allow for a stop racing the first tick
        assert!(store.status().successes <= 2);
    }
}
