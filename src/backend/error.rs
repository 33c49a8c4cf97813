use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the proofing backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Text shown to the reviewer. Status failures surface the response body as-is.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, BackendError::Status { .. })
    }
}
