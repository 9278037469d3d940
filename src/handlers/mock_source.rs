use axum::{extract::Query, Json};
use serde::Deserialize;

use crate::metrics::MetricRecord;
use crate::mock_data::{MockGenerator, DEFAULT_COUNT};

use super::AppError;

const MAX_COUNT: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct MockQuery {
    #[serde(default = "default_count")]
    pub count: usize,
    /// Fixed seed for reproducible batches; random when absent
    pub seed: Option<u64>,
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

// ─── GET /metrics ────────────────────────────────────────────────
/// Stand-in data source: a generated batch in the same wire shape a real
/// metrics endpoint would return.

pub async fn mock_metrics(Query(query): Query<MockQuery>) -> Result<Json<Vec<MetricRecord>>, AppError> {
    if query.count == 0 || query.count > MAX_COUNT {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {MAX_COUNT}"
        )));
    }

    let seed = query.seed.unwrap_or_else(rand::random);
    let now = chrono::Utc::now().timestamp_millis();
    Ok(Json(MockGenerator::new(seed).generate(query.count, now)))
}
