use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{FetchError, StartupError};
use crate::metrics::MetricRecord;
use crate::mock_data::MockGenerator;

/// Anything that can hand the refresh controller a fresh batch.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<MetricRecord>, FetchError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

// ─── HTTP source ─────────────────────────────────────────────────

/// Polls a URL that answers with a JSON array of request records.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StartupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StartupError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<MetricRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        let records: Vec<MetricRecord> = serde_json::from_slice(&body)?;
        validate(&records)?;

        Ok(reidentify(records))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Latency must be a finite, non-negative number of milliseconds.
fn validate(records: &[MetricRecord]) -> Result<(), FetchError> {
    match records
        .iter()
        .position(|r| !r.response_time_ms.is_finite() || r.response_time_ms < 0.0)
    {
        Some(index) => Err(FetchError::Malformed(format!(
            "record {index} has invalid responseTimeMs"
        ))),
        None => Ok(()),
    }
}

/// Wire ids are not trusted to be unique; derive them from position instead.
pub fn reidentify(records: Vec<MetricRecord>) -> Vec<MetricRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            record.id = format!("req-{index}-{}", record.timestamp);
            record
        })
        .collect()
}

// ─── Mock source ─────────────────────────────────────────────────

/// Generated batches for demos and local development.
pub struct MockSource {
    generator: Mutex<MockGenerator>,
    count: usize,
}

impl MockSource {
    pub fn new(seed: u64, count: usize) -> Self {
        Self {
            generator: Mutex::new(MockGenerator::new(seed)),
            count,
        }
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch(&self) -> Result<Vec<MetricRecord>, FetchError> {
        let now = chrono::Utc::now().timestamp_millis();
        Ok(self.generator.lock().generate(self.count, now))
    }

    fn describe(&self) -> String {
        format!("mock generator ({} records)", self.count)
    }
}
