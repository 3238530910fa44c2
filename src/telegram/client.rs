use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::config::TelegramConfig;
use crate::error::Error;
use crate::telegram::types::{ApiReply, OutgoingMessage};

/// Outbound seam to the Bot API, mocked in handler tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Deliver one message. Any HTTP response from the provider is returned
    /// as an [`ApiReply`]; only transport failures are errors.
    async fn send_message(
        &self,
        token: &str,
        message: &OutgoingMessage,
    ) -> Result<ApiReply, Error>;
}

/// Bot API client over HTTPS. One attempt per message, no retries.
pub struct BotClient {
    http: Client,
    api_base: String,
}

impl BotClient {
    pub fn new(config: &TelegramConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn send_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, token)
    }
}

#[async_trait]
impl BotApi for BotClient {
    async fn send_message(
        &self,
        token: &str,
        message: &OutgoingMessage,
    ) -> Result<ApiReply, Error> {
        let response = self
            .http
            .post(self.send_url(token))
            .json(message)
            .send()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        info!(status, body = %body, "sendMessage reply");

        Ok(ApiReply { status, body })
    }
}
