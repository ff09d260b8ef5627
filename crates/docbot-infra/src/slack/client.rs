//! SlackTransport -- [`MessageTransport`] over the Slack Web API.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use docbot_core::transport::MessageTransport;
use docbot_types::error::TransportError;

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Every Web API response carries `ok`; failures add `error`.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts replies with `chat.postMessage`.
pub struct SlackTransport {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl SlackTransport {
    pub fn new(token: SecretString) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Send(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            token,
            base_url: "https://slack.com/api".to_string(),
        })
    }

    /// Override the API base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl MessageTransport for SlackTransport {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&PostMessage {
                channel: channel_id,
                text,
            })
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Send(format!("HTTP {status}")));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Send(format!("unreadable response: {e}")))?;
        check_api_response(body)
    }
}

fn check_api_response(body: ApiResponse) -> Result<(), TransportError> {
    if body.ok {
        Ok(())
    } else {
        Err(TransportError::Rejected(
            body.error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}
