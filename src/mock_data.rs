use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::metrics::{round2, MetricRecord};

// ─── Constants ───────────────────────────────────────────────────

pub const DEFAULT_COUNT: usize = 500;

/// Records are spread over the hour leading up to `now`.
const WINDOW_MS: i64 = 60 * 60 * 1000;

// ─── Pools ───────────────────────────────────────────────────────

static METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

static PATHS: &[&str] = &[
    "/api/users",
    "/api/users/:id",
    "/api/posts",
    "/api/posts/:id",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/dashboard",
    "/api/settings",
    "/health",
    "/metrics",
];

static STATUS_CODES: &[u16] = &[200, 201, 204, 400, 401, 403, 404, 500, 502, 503];
static STATUS_WEIGHTS: &[f64] = &[0.45, 0.15, 0.1, 0.08, 0.05, 0.03, 0.08, 0.04, 0.01, 0.01];

// ─── Generator ───────────────────────────────────────────────────

/// Seedable source of realistic-looking request batches.
///
/// Only used as a demo data source and as a test fixture; the aggregators
/// never depend on it.
pub struct MockGenerator {
    rng: StdRng,
    statuses: WeightedIndex<f64>,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            statuses: status_distribution(),
        }
    }

    /// `count` records from the hour before `now_ms`, newest first.
    pub fn generate(&mut self, count: usize, now_ms: i64) -> Vec<MetricRecord> {
        let start_ms = now_ms - WINDOW_MS;
        let mut records = Vec::with_capacity(count);

        for i in 0..count {
            let status = STATUS_CODES[self.statuses.sample(&mut self.rng)];
            let response_time_ms = round2(self.latency_ms(status));
            let ip = self.ip();

            records.push(MetricRecord {
                id: format!("req-{i}-{now_ms}"),
                ip,
                method: METHODS[self.rng.gen_range(0..METHODS.len())].to_owned(),
                path: PATHS[self.rng.gen_range(0..PATHS.len())].to_owned(),
                status,
                response_time_ms,
                timestamp: self.rng.gen_range(start_ms..now_ms),
            });
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Server errors are slow, client errors fail fast.
    fn latency_ms(&mut self, status: u16) -> f64 {
        match status {
            500..=u16::MAX => self.rng.gen_range(2000.0..7000.0),
            400..=499 => self.rng.gen_range(50.0..150.0),
            _ => self.rng.gen_range(20.0..820.0),
        }
    }

    fn ip(&mut self) -> String {
        let octets: [u8; 4] = self.rng.gen();
        format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
    }
}

fn status_distribution() -> WeightedIndex<f64> {
    // Static, non-empty, strictly positive table
    WeightedIndex::new(STATUS_WEIGHTS).expect("status weights")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn same_seed_same_batch() {
        let a = MockGenerator::new(42).generate(100, NOW);
        let b = MockGenerator::new(42).generate(100, NOW);
        assert_eq!(a, b);

        let c = MockGenerator::new(43).generate(100, NOW);
        assert_ne!(a, c);
    }

    #[test]
    fn records_stay_inside_the_pools() {
        let batch = MockGenerator::new(7).generate(DEFAULT_COUNT, NOW);

        assert_eq!(batch.len(), DEFAULT_COUNT);
        for r in &batch {
            assert!(METHODS.contains(&r.method.as_str()));
            assert!(PATHS.contains(&r.path.as_str()));
            assert!(STATUS_CODES.contains(&r.status));
            assert!(r.timestamp >= NOW - WINDOW_MS && r.timestamp < NOW);
            assert!(r.id.starts_with("req-"));
        }
    }

    #[test]
    fn latency_is_skewed_by_status_class() {
        let batch = MockGenerator::new(5).generate(2000, NOW);
        for r in &batch {
            let ms = r.response_time_ms;
            match r.status {
                500..=u16::MAX => assert!((2000.0..=7000.0).contains(&ms)),
                400..=499 => assert!((50.0..=150.0).contains(&ms)),
                _ => assert!((20.0..=820.0).contains(&ms)),
            }
        }
    }

    #[test]
    fn newest_first() {
        let batch = MockGenerator::new(1).generate(50, NOW);
        assert!(batch.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn empty_request_is_empty_batch() {
        assert!(MockGenerator::new(1).generate(0, NOW).is_empty());
    }
}
