use mailbridge_transport::{ConfigSource, EnvSource};
use serde::{Deserialize, Serialize};

use crate::error::SendGridError;

/// Variable holding the SendGrid API key.
pub const API_KEY_VAR: &str = "SENDGRID_API_KEY";

/// Variable overriding the SendGrid API base URL.
pub const API_BASE_URL_VAR: &str = "SENDGRID_API_BASE_URL";

/// Sender used when a message has no `from` address.
pub const DEFAULT_FROM_EMAIL_VAR: &str = "SENDGRID_DEFAULT_FROM_EMAIL";

/// When set, every message is delivered to this address instead of its `to`
/// recipients.
pub const TEST_EMAIL_VAR: &str = "SENDGRID_TEST_EMAIL";

/// Public SendGrid API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.sendgrid.com";

/// Configuration for the SendGrid HTTP client.
///
/// # Examples
///
/// ```
/// use mailbridge_sendgrid::SendGridConfig;
///
/// let config = SendGridConfig::new("SG.xxxx").with_timeout_secs(10);
/// assert_eq!(config.api_base_url, "https://api.sendgrid.com");
/// assert_eq!(config.mail_send_url(), "https://api.sendgrid.com/v3/mail/send");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct SendGridConfig {
    /// API key sent as a bearer token.
    pub api_key: String,

    /// Base URL for the SendGrid API. Override this for testing against a
    /// mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout in seconds. Defaults to 30.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SendGridConfig {
    /// Create a configuration for the public SendGrid API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Read `SENDGRID_API_KEY` and, optionally, `SENDGRID_API_BASE_URL` from
    /// `source`.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, SendGridError> {
        let api_key = source
            .get(API_KEY_VAR)
            .ok_or_else(|| SendGridError::Configuration(format!("{API_KEY_VAR} is not set")))?;

        let mut config = Self::new(api_key);
        if let Some(url) = source.get(API_BASE_URL_VAR) {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, SendGridError> {
        Self::from_source(&EnvSource)
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// URL of the Mail Send endpoint.
    pub fn mail_send_url(&self) -> String {
        format!("{}/v3/mail/send", self.api_base_url.trim_end_matches('/'))
    }

    /// URL of the scopes endpoint (used for health checks).
    pub fn scopes_url(&self) -> String {
        format!("{}/v3/scopes", self.api_base_url.trim_end_matches('/'))
    }
}
