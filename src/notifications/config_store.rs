use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::info;

use super::encryption::{CredentialCipher, EncryptionError};
use super::models::{
    ConfigUpdate, ConfigView, DEFAULT_MESSAGE_TEMPLATE, IDENTITY_PLACEHOLDER, NotificationConfig,
};
use crate::storage::{self, KvStore, StorageError};

pub const CONFIG_KEY: &str = "notification-config";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Endpoint token and destination id are both required")]
    MissingCredentials,
    #[error("Message template must contain the {{target_id}} placeholder")]
    TemplateMissingPlaceholder,
    #[error("Stored token is encrypted but no credential key is configured")]
    KeyRequired,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),
}

impl ConfigError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConfigError::MissingCredentials | ConfigError::TemplateMissingPlaceholder
        )
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfig {
    endpoint_token: String,
    #[serde(default)]
    token_sealed: bool,
    destination_id: String,
    message_template: String,
}

/// Owns the notification config and writes it whole on every save.
pub struct ConfigStore {
    kv: Arc<dyn KvStore>,
    cipher: Option<CredentialCipher>,
    config: RwLock<NotificationConfig>,
}

impl ConfigStore {
    pub fn open(kv: Arc<dyn KvStore>, cipher: Option<CredentialCipher>) -> Result<Self, ConfigError> {
        let config = match storage::load_record::<StoredConfig>(kv.as_ref(), CONFIG_KEY)? {
            Some(stored) => {
                let endpoint_token = match (stored.token_sealed, &cipher) {
                    (true, Some(cipher)) => cipher.open(&stored.endpoint_token)?,
                    (true, None) => return Err(ConfigError::KeyRequired),
                    (false, _) => stored.endpoint_token,
                };
                NotificationConfig {
                    endpoint_token,
                    destination_id: stored.destination_id,
                    message_template: stored.message_template,
                }
            }
            None => NotificationConfig::default(),
        };
        info!(configured = config.has_credentials(), "Loaded notification config.");
        Ok(Self {
            kv,
            cipher,
            config: RwLock::new(config),
        })
    }

    pub fn current(&self) -> NotificationConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn view(&self) -> ConfigView {
        ConfigView::from(&self.current())
    }

    /// Validates and overwrites the whole config.
    pub fn save(&self, update: ConfigUpdate) -> Result<ConfigView, ConfigError> {
        let endpoint_token = update.endpoint_token.trim().to_string();
        let destination_id = update.destination_id.trim().to_string();
        if endpoint_token.is_empty() || destination_id.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        let message_template = match update.message_template.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_MESSAGE_TEMPLATE.to_string(),
            Some(template) if !template.contains(IDENTITY_PLACEHOLDER) => {
                return Err(ConfigError::TemplateMissingPlaceholder);
            }
            Some(template) => template.to_string(),
        };

        let next = NotificationConfig {
            endpoint_token,
            destination_id,
            message_template,
        };

        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        let stored = StoredConfig {
            endpoint_token: match &self.cipher {
                Some(cipher) => cipher.seal(&next.endpoint_token)?,
                None => next.endpoint_token.clone(),
            },
            token_sealed: self.cipher.is_some(),
            destination_id: next.destination_id.clone(),
            message_template: next.message_template.clone(),
        };
        storage::save_record(self.kv.as_ref(), CONFIG_KEY, &stored)?;
        *guard = next;
        info!("Notification config saved.");
        Ok(ConfigView::from(&*guard))
    }
}
