use mailbridge_core::ApiResponse;
use thiserror::Error;

/// A provider answered a send request with something other than `202 Accepted`.
///
/// Carries the raw response so callers can tell a rejected address from a
/// provider outage.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderRequestError {
    /// Human-readable description.
    pub message: String,

    /// HTTP status code returned by the provider.
    pub status_code: u16,

    /// The raw provider response.
    pub response: ApiResponse,
}

impl ProviderRequestError {
    /// Build an error from a rejected provider response.
    pub fn new(message: impl Into<String>, response: ApiResponse) -> Self {
        Self {
            message: message.into(),
            status_code: response.status_code,
            response,
        }
    }

    /// The raw response body.
    pub fn body(&self) -> &str {
        &self.response.body
    }
}

/// Errors that can occur while sending a message through a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Required configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The provider rejected the request.
    #[error("provider request failed: {0}")]
    ProviderRequest(#[from] ProviderRequestError),

    /// The provider could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request could not be encoded for the provider.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Returns `true` if the failure is transient and a later attempt may
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::ProviderRequest(e) => e.status_code == 429 || e.status_code >= 500,
            Self::Configuration(_) | Self::Serialization(_) => false,
        }
    }

    /// The provider status code, for provider rejections.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderRequest(e) => Some(e.status_code),
            _ => None,
        }
    }

    /// The raw provider response, for provider rejections.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::ProviderRequest(e) => Some(&e.response),
            _ => None,
        }
    }
}
