//! Unified error types for the BNSS pipeline.

/// Unified error types for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a malformed as-of date).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Connection-level failure (DNS, TLS, timeout) after retries.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Server responded with a terminal HTTP status.
    #[error("HTTP_ERROR: HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// 304 Not Modified received but no prior content hash is recorded.
    #[error("CACHE_INCONSISTENT: 304 for {0} but no cached content hash exists")]
    CacheInconsistent(String),

    /// URL cache bookkeeping failure.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// Upstream document shape drifted from what the parser expects.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// A required artifact from an earlier pipeline step is missing.
    #[error("MISSING_PREREQUISITE: {0}")]
    MissingPrerequisite(String),

    /// Filesystem operation failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON_ERROR: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
