//! Error types for the Mailchimp sink.

use http_transport::HttpError;
use thiserror::Error;

/// Errors raised while writing to Mailchimp.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed connection settings, detected before any
    /// network call.
    #[error("Mailchimp configuration error: {0}")]
    Config(String),

    /// The connect-time ping was rejected.
    #[error("Mailchimp credentials invalid: {status} {body}")]
    Credential { status: u16, body: String },

    /// Connection-level failure (DNS, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] HttpError),

    /// The member PUT came back with a non-success status.
    #[error("Mailchimp upsert failed: {status} {body}")]
    Upsert { status: u16, body: String },

    /// The member body could not be encoded.
    #[error("failed to encode member payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for Mailchimp sink operations.
pub type Result<T> = std::result::Result<T, Error>;
