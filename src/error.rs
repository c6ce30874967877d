//! Error types for the library dashboard client

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Broad error families surfaced to views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received (connection failure or timeout)
    Network,
    /// The backend answered with a non-2xx status
    Http,
    /// The request was rejected locally before being sent
    Validation,
    /// The backend answered with a body we could not understand
    Decode,
}

/// Main client error type.
///
/// Errors are `Clone` because a single coalesced fetch hands the same outcome
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Timeout | ApiError::Network(_) => ErrorKind::Network,
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Message suitable for display next to a retry control
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout => "The server took too long to respond. Please try again.".to_string(),
            ApiError::Network(_) => "Unable to reach the server. Check your connection and try again.".to_string(),
            ApiError::Http { status, message } if *status >= 500 => {
                format!("The server encountered an error ({}): {}", status, message)
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Decode(_) => "The server returned an unexpected response.".to_string(),
        }
    }

    /// Build an HTTP error from a non-2xx response body.
    ///
    /// Uses the backend's `message` (or `error`) field when the body is a JSON
    /// error payload, otherwise falls back to the status text.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let payload_message = serde_json::from_str::<Value>(body).ok().and_then(|v| {
            ["message", "error"]
                .iter()
                .filter_map(|field| v.get(*field).and_then(Value::as_str))
                .map(str::trim)
                .find(|msg| !msg.is_empty())
                .map(str::to_string)
        });

        let message = payload_message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });

        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{}: {}", field, detail)
            })
            .collect();
        fields.sort();
        ApiError::Validation(fields.join(", "))
    }
}

/// Result type alias for client operations
pub type ApiResult<T> = Result<T, ApiError>;
