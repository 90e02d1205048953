use mailbridge_core::ApiResponse;
use mailbridge_transport::{ProviderRequestError, TransportError};
use thiserror::Error;

/// Errors specific to the SendGrid integration.
///
/// These are internal errors that get converted into [`TransportError`] at
/// the public API boundary.
#[derive(Debug, Error)]
pub enum SendGridError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client is missing required configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The SendGrid API answered a non-send request with an error status.
    #[error("SendGrid API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<SendGridError> for TransportError {
    fn from(err: SendGridError) -> Self {
        match err {
            SendGridError::Http(e) => TransportError::Connection(e.to_string()),
            SendGridError::Serialization(e) => TransportError::Serialization(e.to_string()),
            SendGridError::Configuration(msg) => TransportError::Configuration(msg),
            SendGridError::Api { status, body } => ProviderRequestError::new(
                format!("SendGrid API returned HTTP {status}"),
                ApiResponse::new(status, body),
            )
            .into(),
        }
    }
}
