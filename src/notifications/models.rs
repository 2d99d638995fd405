use serde::{Deserialize, Serialize};

/// Substituted with the target identity when a message is rendered.
pub const IDENTITY_PLACEHOLDER: &str = "{target_id}";

pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "⚠️ WARNING! Listing {target_id} has been removed from the store!";

pub const CANARY_MESSAGE: &str =
    "✅ Test message from listing-monitor: this channel is configured correctly.";

/// Credentials and message template for outbound alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub endpoint_token: String,
    pub destination_id: String,
    pub message_template: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint_token: String::new(),
            destination_id: String::new(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

impl NotificationConfig {
    pub fn has_credentials(&self) -> bool {
        !self.endpoint_token.is_empty() && !self.destination_id.is_empty()
    }

    /// Replaces the first placeholder only.
    pub fn render(&self, identity: &str) -> String {
        self.message_template.replacen(IDENTITY_PLACEHOLDER, identity, 1)
    }
}

/// Fields accepted by the save-config operation. An empty template restores the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub endpoint_token: String,
    pub destination_id: String,
    #[serde(default)]
    pub message_template: Option<String>,
}

/// Read-back view of the config with the token masked.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub endpoint_token: String,
    pub destination_id: String,
    pub message_template: String,
    pub configured: bool,
}

impl From<&NotificationConfig> for ConfigView {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            endpoint_token: mask_token(&config.endpoint_token),
            destination_id: config.destination_id.clone(),
            message_template: config.message_template.clone(),
            configured: config.has_credentials(),
        }
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

/// A rendered alert ready for a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination_id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_once() {
        let config = NotificationConfig {
            message_template: "{target_id} gone ({target_id})".to_string(),
            ..Default::default()
        };
        assert_eq!(config.render("pkg.demo"), "pkg.demo gone ({target_id})");
    }

    #[test]
    fn test_default_template_mentions_identity() {
        let config = NotificationConfig::default();
        assert!(config.render("pkg.demo").contains("pkg.demo"));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_view_masks_token() {
        let config = NotificationConfig {
            endpoint_token: "123456:ABCDEF".to_string(),
            destination_id: "-100".to_string(),
            ..Default::default()
        };
        let view = ConfigView::from(&config);
        assert_eq!(view.endpoint_token, "*********CDEF");
        assert!(view.configured);
        assert_eq!(mask_token("abc"), "***");
    }
}
