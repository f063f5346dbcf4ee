/*
[INPUT]:  Error sources (HTTP transport, backend failure payloads, serialization, WebSocket)
[OUTPUT]: Structured error type with status code and retry hints
[POS]:    Error handling layer - unified error type for the gateway crate
[UPDATE]: When adding new error sources or changing message extraction
*/

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Main error type for backend gateway calls
#[derive(Error, Debug)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded its deadline
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Backend answered with an explicit failure (non-2xx or `success: false`)
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    /// Response body was not the JSON we expected
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response was JSON but structurally unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Check if the error is a transport-level failure worth retrying later
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Http(_)
            | GatewayError::Timeout { .. }
            | GatewayError::Serialization(_)
            | GatewayError::InvalidResponse(_)
            | GatewayError::WebSocket(_) => true,
            GatewayError::Api { status, .. } => status.is_some_and(|code| code >= 500),
            GatewayError::UrlParse(_) | GatewayError::Config(_) => false,
        }
    }

    /// HTTP status code attached to the failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => *status,
            GatewayError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        GatewayError::Api {
            status: Some(status.as_u16()),
            message: message.into(),
        }
    }

    /// Classify a reqwest failure, promoting deadline expiry to `Timeout`
    pub(crate) fn from_transport(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout { duration: deadline }
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Http(err)
        }
    }

    /// Build an API error from a non-2xx response body.
    ///
    /// Message precedence: `message`, `error`, `detail`, then `HTTP Error: <status>`.
    pub fn from_failure_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| extract_message(&value))
            .unwrap_or_else(|| format!("HTTP Error: {}", status.as_u16()));
        GatewayError::api_error(status, message)
    }
}

/// Pull a human-readable failure message out of a backend JSON payload
pub fn extract_message(value: &Value) -> Option<String> {
    ["message", "error", "detail"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
