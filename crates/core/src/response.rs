use serde::{Deserialize, Serialize};

/// HTTP status a provider returns when it has queued a message for delivery.
pub const STATUS_ACCEPTED: u16 = 202;

/// Raw response returned by a provider's HTTP API.
///
/// Transports interpret only the status code; the body and headers are kept
/// for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Response body, verbatim.
    pub body: String,

    /// Response headers in the order they were received.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The provider-assigned message id, when the provider reports one.
    pub fn message_id(&self) -> Option<&str> {
        self.header("x-message-id")
    }

    /// Returns `true` for `202 Accepted`.
    pub fn is_accepted(&self) -> bool {
        self.status_code == STATUS_ACCEPTED
    }
}
