use async_trait::async_trait;
use thiserror::Error;

use super::models::OutboundMessage;

pub mod telegram;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Delivers a rendered message to an outbound channel.
///
/// The token is an opaque bearer credential; `message.destination_id` names the recipient.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, endpoint_token: &str, message: &OutboundMessage) -> Result<(), SenderError>;
}
