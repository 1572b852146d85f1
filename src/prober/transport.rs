use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure categories, independent of any HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Timeout,
    Protocol,
    Tls,
    InvalidRequest,
    Decode,
    Redirect,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Performs one GET exchange and reports the final status code.
///
/// Implementations read the full response body before returning, so
/// the caller's timing covers the whole exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<u16, TransportFailure>;
}
