use std::time::Duration;

use async_trait::async_trait;
use mailbridge_core::ApiResponse;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info};

use crate::config::SendGridConfig;
use crate::error::SendGridError;
use crate::types::SendGridMail;

/// The provider capability the SendGrid transport sends through.
///
/// Implementations return the provider's answer for every HTTP status; only
/// failures to obtain an answer at all are errors. Interpreting the status is
/// the transport's job.
#[async_trait]
pub trait MailApi: Send + Sync + std::fmt::Debug {
    /// Submit a request to the Mail Send endpoint.
    async fn send(&self, mail: &SendGridMail) -> Result<ApiResponse, SendGridError>;

    /// Verify the API is reachable and the credentials are accepted.
    async fn health_check(&self) -> Result<(), SendGridError>;

    /// Return the backend name (e.g. `"sendgrid"`).
    fn backend_name(&self) -> &'static str;
}

/// `reqwest`-based client for the SendGrid v3 API.
pub struct SendGridClient {
    config: SendGridConfig,
    client: Client,
}

impl std::fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridClient")
            .field("config", &self.config)
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl SendGridClient {
    /// Create a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: SendGridConfig) -> Result<Self, SendGridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a client sharing an existing `reqwest::Client`.
    pub fn with_client(config: SendGridConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SendGridConfig {
        &self.config
    }
}

#[async_trait]
impl MailApi for SendGridClient {
    async fn send(&self, mail: &SendGridMail) -> Result<ApiResponse, SendGridError> {
        let url = self.config.mail_send_url();
        let body = serde_json::to_vec(mail)?;

        debug!(url = %url, bytes = body.len(), "posting to SendGrid Mail Send API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "SendGrid request failed"))?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.text().await?;

        debug!(status = status_code, "SendGrid responded");

        Ok(ApiResponse {
            status_code,
            body,
            headers,
        })
    }

    async fn health_check(&self) -> Result<(), SendGridError> {
        debug!("performing SendGrid health check via scopes lookup");

        let response = self
            .client
            .get(self.config.scopes_url())
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "SendGrid health check failed");
            return Err(SendGridError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("SendGrid health check passed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sendgrid"
    }
}
