use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::TelegramConfig;

/// Client for the Telegram Bot API `sendMessage` call.
///
/// The delivery target (chat id + bot credential) is injected at
/// construction; nothing is read from the environment at call time, so tests
/// can point `api_base` at a fake server.
pub struct TelegramClient {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Deliver one message to the configured chat.
    ///
    /// Returns the Telegram API response status; the caller decides whether a
    /// non-success status is worth more than a log line. No retries.
    pub async fn send_message(&self, text: &str) -> Result<StatusCode> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        );

        debug!("Sending Telegram message to chat {}", self.config.chat_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "MarkdownV2"),
            ])
            .send()
            .await
            .context("Failed to send request to Telegram")?;

        Ok(response.status())
    }
}
