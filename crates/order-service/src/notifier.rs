//! Best-effort WhatsApp notification through the CallMeBot gateway

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use tracing::{info, warn};

use crate::config::{NotifierConfig, PLACEHOLDER_API_KEY};

/// What happened to a notification. Never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Phone or API key missing, or the API key is the placeholder
    Skipped,
    /// Gateway answered 200
    Sent,
    /// Gateway answered with another status
    Rejected(StatusCode),
    /// Request never completed (connect error, timeout, bad URL)
    Failed,
}

/// Client for the WhatsApp gateway
pub struct WhatsAppNotifier {
    phone: String,
    api_key: String,
    gateway_url: String,
    client: reqwest::Client,
}

impl WhatsAppNotifier {
    /// Create a notifier whose requests are bounded by the configured timeout
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build gateway HTTP client")?;

        Ok(Self {
            phone: config.phone.clone(),
            api_key: config.api_key.clone(),
            gateway_url: config.gateway_url.clone(),
            client,
        })
    }

    /// Whether messages will actually be sent
    pub fn is_configured(&self) -> bool {
        !self.phone.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && self.api_key != PLACEHOLDER_API_KEY
    }

    /// Gateway URL carrying `text`, form-encoded
    pub fn request_url(&self, text: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.gateway_url,
            &[
                ("phone", self.phone.as_str()),
                ("text", text),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .with_context(|| format!("Invalid gateway URL: {}", self.gateway_url))
    }

    /// Send `text` once. Failures are logged and swallowed; there is no retry.
    pub async fn notify(&self, text: &str) -> NotifyOutcome {
        if !self.is_configured() {
            info!("WhatsApp not sent (missing or placeholder API key)");
            return NotifyOutcome::Skipped;
        }

        let url = match self.request_url(text) {
            Ok(url) => url,
            Err(e) => {
                warn!("WhatsApp sending failed: {:#}", e);
                return NotifyOutcome::Failed;
            }
        };

        match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("WhatsApp message sent");
                NotifyOutcome::Sent
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let snippet: String = body.chars().take(120).collect();

                warn!("WhatsApp API returned status {}: {}", status, snippet);
                NotifyOutcome::Rejected(status)
            }
            Err(e) => {
                // reqwest errors carry the request URL, which holds the API key
                warn!("WhatsApp sending failed: {}", e.without_url());
                NotifyOutcome::Failed
            }
        }
    }
}
