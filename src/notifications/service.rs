use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::models::{CANARY_MESSAGE, NotificationConfig, OutboundMessage};
use super::senders::{NotificationSender, SenderError};
use crate::monitor::models::WatchedTarget;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification channel is not configured: endpoint token and destination id are required")]
    ConfigMissing,
    #[error("Sender error: {0}")]
    SendFailed(#[from] SenderError),
}

/// Renders alert text and hands it to the configured sender. Each call is a
/// single delivery attempt; callers own the decision of when to call.
pub struct NotificationService {
    sender: Arc<dyn NotificationSender>,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    pub async fn notify(
        &self,
        target: &WatchedTarget,
        config: &NotificationConfig,
    ) -> Result<(), NotificationError> {
        if !config.has_credentials() {
            warn!(identity = %target.identity, "Skipping notification: channel not configured.");
            return Err(NotificationError::ConfigMissing);
        }

        let message = OutboundMessage {
            destination_id: config.destination_id.clone(),
            text: config.render(&target.identity),
        };
        self.sender.send(&config.endpoint_token, &message).await?;
        info!(identity = %target.identity, "Removal notification sent.");
        Ok(())
    }

    /// Sends a fixed canary message to verify credentials. Touches no target state.
    pub async fn test_channel(&self, config: &NotificationConfig) -> Result<(), NotificationError> {
        if !config.has_credentials() {
            return Err(NotificationError::ConfigMissing);
        }

        let message = OutboundMessage {
            destination_id: config.destination_id.clone(),
            text: CANARY_MESSAGE.to_string(),
        };
        self.sender.send(&config.endpoint_token, &message).await?;
        info!("Test notification sent.");
        Ok(())
    }
}
