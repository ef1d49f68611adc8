use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the statistics query service.
///
/// Carried through to the rendering side untouched; nothing in this crate
/// interprets or retries it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    pub status: Option<u16>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Error)]
pub enum MessagesError {
    #[error("invalid labels document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown label key '{0}'")]
    UnknownKey(String),
}
