use std::time::Duration;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Failures reported by the protocol transport.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("failed to start protocol bridge `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol bridge closed")]
    Closed,

    #[error("{method} rejected by protocol bridge: {message}")]
    Rejected {
        method: &'static str,
        message: String,
    },

    #[error("{method} timed out after {elapsed:?}")]
    Timeout {
        method: &'static str,
        elapsed: Duration,
    },

    #[error("malformed bridge frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("bridge IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IsRetryable for ProtocolError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProtocolError::Closed | ProtocolError::Timeout { .. } | ProtocolError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_failures_are_final() {
        let spawn = ProtocolError::Spawn {
            program: "missing-bridge".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!spawn.is_retryable());
        assert!(ProtocolError::Closed.is_retryable());
        assert!(
            !ProtocolError::Rejected {
                method: "sendMessage",
                message: "not connected".to_string()
            }
            .is_retryable()
        );
    }
}
