//! Secondary messaging channel client
//!
//! Telegram-style bot API: token in the URL, HTML parse mode.
//! Timeouts surface as [`ChannelError::Timeout`] so the dispatcher's
//! bounded retry applies; every other failure aborts immediately.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use sector_engine::{ChannelError, NotifyChannel};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the secondary messaging API.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramClient {
    /// Client against the default API host.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> ClientResult<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, chat_id)
    }

    /// Client against a specific API host.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Send one HTML-formatted message to the configured chat.
    pub async fn send_message(&self, text: &str) -> ClientResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: SendResponse = response.json().await?;
        if !parsed.ok {
            return Err(ClientError::Api(
                parsed.description.unwrap_or_else(|| "send rejected".into()),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl NotifyChannel for TelegramClient {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.send_message(text).await.map_err(|err| match err {
            ClientError::Http(e) if e.is_timeout() => ChannelError::Timeout,
            other => ChannelError::Send(other.to_string()),
        })
    }
}
