/*
[INPUT]:  Gateway failures, local validation, session file I/O
[OUTPUT]: ClientError taxonomy surfaced to callers of the session layer
[POS]:    Error handling layer - session crate
[UPDATE]: When adding failure kinds or changing gateway error mapping
*/

use std::time::Duration;
use thiserror::Error;
use tradedash_gateway::GatewayError;

/// Failure of a session-layer operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected locally; no request was sent
    #[error("{0}")]
    Validation(String),

    /// Network failure, timeout or unreadable response
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// Explicit failure reported by the backend, message verbatim
    #[error("{message}")]
    Gateway {
        message: String,
        status: Option<u16>,
    },

    /// Busy or incompatible state; no request was sent
    #[error("{0}")]
    StateConflict(String),

    /// Session file could not be read or written
    #[error("session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ClientError::StateConflict(message.into())
    }

    pub fn timed_out(limit: Duration) -> Self {
        ClientError::Transport {
            message: format!("request timed out after {limit:?}"),
            status: None,
        }
    }

    /// Failures that never reached the backend
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_) | ClientError::StateConflict(_) | ClientError::Storage(_)
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } | ClientError::Gateway { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        let status = err.status_code();
        match err {
            GatewayError::Api { message, status } => ClientError::Gateway { message, status },
            other => ClientError::Transport {
                message: other.to_string(),
                status,
            },
        }
    }
}
