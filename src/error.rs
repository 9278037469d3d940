use thiserror::Error;

/// Why a refresh cycle could not obtain a batch.
///
/// All variants are cycle-scoped: the previous views stay up and the next
/// tick tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("metrics source unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("metrics source returned HTTP {0}")]
    Status(u16),
    #[error("malformed metrics payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        FetchError::Malformed(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("refresh controller is already running")]
    AlreadyRunning,
}

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server exited with error: {0}")]
    Serve(#[source] std::io::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
