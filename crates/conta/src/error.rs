use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ContaError {
    /// The grouping key provider produced an empty segment key. Rejected
    /// before any storage access.
    InvalidSegmentKey,
    /// The compare-and-swap retry cap was exhausted for one segment.
    Contention { segment: String, attempts: u32 },
    /// Invalid configuration, surfaced at construction time only.
    Config(String),
    /// The backing store is unreachable or a statement failed for a reason
    /// other than losing the optimistic update race.
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ContaError>;

impl fmt::Display for ContaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContaError::InvalidSegmentKey => write!(f, "segment key must be non-empty"),
            ContaError::Contention { segment, attempts } => {
                write!(f, "gave up on segment {segment} after {attempts} contended attempts")
            }
            ContaError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            ContaError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for ContaError {}

impl ContaError {
    pub fn code(&self) -> &'static str {
        match self {
            ContaError::InvalidSegmentKey => "invalid_segment_key",
            ContaError::Contention { .. } => "contention_exhausted",
            ContaError::Config(_) => "invalid_config",
            ContaError::Storage(_) => "storage_error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&ContaError> for ErrorResponse {
    fn from(err: &ContaError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}
