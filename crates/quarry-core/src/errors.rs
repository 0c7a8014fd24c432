//! Error taxonomy for the quarry client.
//!
//! Every condition a caller must react to gets its own variant with typed
//! context fields. Cache-document corruption is deliberately absent: a
//! corrupt cache is recovered locally (treated as empty) and never surfaced.

/// Unified error type for the quarry client.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error("config file not found: {path}")]
    ConfigMissing { path: String },

    #[error("config parse failed: {reason}")]
    ConfigInvalid { reason: String },

    #[error("{endpoint} returned {status}: {body}")]
    RemoteCallFailed {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("embedding model load failed: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("cache write failed at {path}: {reason}")]
    CacheIo { path: String, reason: String },
}

impl QuarryError {
    /// Whether this error is a tripped request timeout, as opposed to a
    /// response the backend actually produced.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QuarryError::Timeout { .. })
    }

    /// HTTP status code, when the backend produced a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuarryError::RemoteCallFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias used across the workspace.
pub type QuarryResult<T> = Result<T, QuarryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_call_failed_formats_status_and_body() {
        let err = QuarryError::RemoteCallFailed {
            endpoint: "health".to_string(),
            status: 503,
            body: "index rebuilding".to_string(),
        };
        assert_eq!(err.to_string(), "health returned 503: index rebuilding");
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_is_distinguishable() {
        let err = QuarryError::Timeout {
            endpoint: "search".to_string(),
            timeout_ms: 250,
        };
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
    }
}
