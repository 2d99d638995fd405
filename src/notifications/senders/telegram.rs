use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{NotificationSender, SenderError};
use crate::notifications::models::OutboundMessage;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Pushes alerts through the Telegram Bot API `sendMessage` method.
pub struct TelegramSender {
    client: Client,
    api_base: String,
}

impl TelegramSender {
    pub fn new(timeout: Duration) -> Result<Self, SenderError> {
        Self::with_api_base(timeout, DEFAULT_API_BASE)
    }

    /// Targets a Bot API compatible server other than `api.telegram.org`.
    pub fn with_api_base(timeout: Duration, api_base: impl Into<String>) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_base))
    }

    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!("{}/bot{bot_token}/sendMessage", self.api_base.trim_end_matches('/'))
    }
}

/// Escapes the three characters Telegram's HTML parse mode treats as markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, endpoint_token: &str, message: &OutboundMessage) -> Result<(), SenderError> {
        if endpoint_token.is_empty() || message.destination_id.is_empty() {
            return Err(SenderError::InvalidConfiguration(
                "bot token and chat id are required".to_string(),
            ));
        }

        let escaped = escape_html(&message.text);
        let payload = TelegramMessage {
            chat_id: &message.destination_id,
            text: &escaped,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.endpoint(endpoint_token))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Telegram API returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
