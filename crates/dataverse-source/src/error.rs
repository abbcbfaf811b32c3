//! Error types for the Dataverse source.

use http_transport::HttpError;
use thiserror::Error;

/// Errors raised while reading from Dataverse.
#[derive(Error, Debug)]
pub enum DataverseError {
    /// Missing or malformed connection settings, detected before any
    /// network call.
    #[error("Dataverse configuration error: {0}")]
    Config(String),

    /// The token endpoint rejected the client-credentials grant.
    #[error("Dataverse token request failed: {0}")]
    Auth(String),

    /// Connection-level failure (DNS, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] HttpError),

    /// Non-success status outside the retryable set.
    #[error("Dataverse request failed: {status} {body}")]
    Http { status: u16, body: String },

    /// The server kept throttling past the attempt budget.
    #[error("Dataverse still throttling after {attempts} attempts")]
    RetryBudgetExceeded { attempts: u32 },

    /// Response body did not match the expected JSON shape.
    #[error("failed to decode Dataverse response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for Dataverse source operations.
pub type Result<T> = std::result::Result<T, DataverseError>;
