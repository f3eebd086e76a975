//! Error types for the ArangoDB driver.

use serde::Deserialize;
use thiserror::Error;

/// ArangoDB error number for a missing document.
pub const ERROR_DOCUMENT_NOT_FOUND: i64 = 1202;

/// Errors returned by `ArangoClient` and the handles derived from it.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Response: {code}, Error: {error_num} - {message}")]
    Server {
        code: u16,
        error_num: i64,
        message: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid {kind} name: {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("cursor has more results but no cursor id")]
    CursorExhausted,
}

impl DriverError {
    /// True when the server reported that the addressed document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DriverError::Server { code: 404, .. }
                | DriverError::Server {
                    error_num: ERROR_DOCUMENT_NOT_FOUND,
                    ..
                }
        )
    }

    /// Build a server error from a non-success response body.
    ///
    /// ArangoDB normally answers failures with a JSON envelope; proxies and
    /// very old servers may not, so the raw body is kept as the message.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => DriverError::Server {
                code: envelope.code.unwrap_or(status),
                error_num: envelope.error_num.unwrap_or(0),
                message: envelope
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            },
            Err(_) => DriverError::Server {
                code: status,
                error_num: 0,
                message: body.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default, rename = "errorNum")]
    error_num: Option<i64>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
