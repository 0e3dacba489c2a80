//! Error taxonomy shared by the store, the enrichment client, and the server.
//!
//! | Error | Surfaces as |
//! |-------|-------------|
//! | [`RecordError::Validation`] | 400 |
//! | [`RecordError::NotFound`] | 404 |
//! | [`RecordError::Unavailable`] | 503 |
//! | [`RecordError::Internal`] | 500, generic message |
//! | [`UpstreamError`] | never; replaced by fallback content |

use thiserror::Error;

/// Errors returned by a [`KvStore`](crate::kv::KvStore) backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// The backend is not configured or cannot be reached.
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),

    #[error("key-value store error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Errors returned by [`RecordStore`](crate::records::RecordStore) operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("inspiration not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RecordError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecordError::Validation(vec![message.into()])
    }
}

impl From<KvError> for RecordError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::Unavailable(msg) => RecordError::Unavailable(msg),
            KvError::Backend(e) => RecordError::Internal(e),
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::Internal(err.into())
    }
}

/// Failures of the external enrichment call. Absorbed inside
/// [`crate::enrich`]; callers only ever see fallback content.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("enrichment endpoint or credential not configured")]
    NotConfigured,

    #[error("enrichment request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("enrichment endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("enrichment response had no candidate content")]
    EmptyResponse,

    #[error("enrichment response was not valid JSON content: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Network errors, 429, and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
