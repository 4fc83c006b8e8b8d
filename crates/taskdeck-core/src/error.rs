use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the task facade and the transformer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid task payload: {0}")]
    InvalidInput(String),

    /// User-displayable message, already translated from the wire failure.
    #[error("{0}")]
    Operation(String),
}

/// Transport-level failures. The repositories forward these untouched.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{method} {url} failed: {source}")]
    Request {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: StatusCode,
    },

    #[error("failed encoding request body for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RepositoryError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Rejected(String),
}
