//! The operations exposed to the UI and CLI layers.

use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::monitor::checker::{AvailabilityChecker, CheckError, HttpAvailabilityChecker};
use crate::monitor::clock::{Clock, SystemClock};
use crate::monitor::models::{BatchResult, TargetSummary, WatchedTarget};
use crate::monitor::scheduler::{
    Scheduler, SchedulerSettings, SchedulerStatus, TargetCheck, TargetCheckError, TriggerOutcome,
};
use crate::monitor::target_store::{TargetError, TargetStore};
use crate::notifications::config_store::{ConfigError, ConfigStore};
use crate::notifications::encryption::{CredentialCipher, EncryptionError};
use crate::notifications::models::{ConfigUpdate, ConfigView};
use crate::notifications::senders::telegram::TelegramSender;
use crate::notifications::senders::{NotificationSender, SenderError};
use crate::notifications::service::{NotificationError, NotificationService};
use crate::storage::{FileKvStore, KvStore, StorageError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Notification config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Credential key error: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("Checker setup failed: {0}")]
    Checker(#[from] CheckError),
    #[error("Sender setup failed: {0}")]
    Sender(#[from] SenderError),
}

/// Capabilities the monitor needs from the outside world.
pub struct Collaborators {
    pub kv: Arc<dyn KvStore>,
    pub cipher: Option<CredentialCipher>,
    pub checker: Arc<dyn AvailabilityChecker>,
    pub sender: Arc<dyn NotificationSender>,
    pub clock: Arc<dyn Clock>,
}

pub struct MonitorService {
    targets: Arc<TargetStore>,
    config: Arc<ConfigStore>,
    notifications: Arc<NotificationService>,
    scheduler: Arc<Scheduler>,
}

impl MonitorService {
    pub fn new(parts: Collaborators, settings: SchedulerSettings) -> Result<Self, StartupError> {
        let targets = Arc::new(TargetStore::open(parts.kv.clone())?);
        let config = Arc::new(ConfigStore::open(parts.kv, parts.cipher)?);
        let notifications = Arc::new(NotificationService::new(parts.sender));
        let scheduler = Arc::new(Scheduler::new(
            targets.clone(),
            config.clone(),
            parts.checker,
            notifications.clone(),
            parts.clock,
            settings,
        ));
        Ok(Self {
            targets,
            config,
            notifications,
            scheduler,
        })
    }

    /// Wires the production collaborators: file storage, HTTP checker and Telegram sender.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let cipher = config
            .credential_key
            .as_deref()
            .map(CredentialCipher::from_hex_key)
            .transpose()?;
        let parts = Collaborators {
            kv: Arc::new(FileKvStore::new(&config.data_dir)?),
            cipher,
            checker: Arc::new(HttpAvailabilityChecker::new(config.probe_timeout())?),
            sender: Arc::new(TelegramSender::new(config.probe_timeout())?),
            clock: Arc::new(SystemClock),
        };
        Self::new(parts, config.scheduler_settings())
    }

    pub fn add_target(&self, identity: &str, locator: &str) -> Result<(), TargetError> {
        self.targets.add(identity, locator)
    }

    pub fn add_targets_batch(&self, text: &str) -> Result<BatchResult, TargetError> {
        self.targets.add_batch(text)
    }

    pub fn remove_target(&self, identity: &str) -> Result<bool, TargetError> {
        self.targets.remove(identity)
    }

    pub fn remove_targets<I, S>(&self, identities: I) -> Result<usize, TargetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.targets.remove_many(identities)
    }

    pub fn list_targets(&self) -> Vec<WatchedTarget> {
        self.targets.list()
    }

    pub fn summary(&self) -> TargetSummary {
        self.targets.summary()
    }

    pub fn config_view(&self) -> ConfigView {
        self.config.view()
    }

    pub fn save_config(&self, update: ConfigUpdate) -> Result<ConfigView, ConfigError> {
        self.config.save(update)
    }

    pub async fn test_channel(&self) -> Result<(), NotificationError> {
        self.notifications.test_channel(&self.config.current()).await
    }

    pub fn pause(&self) {
        self.scheduler.pause();
    }

    pub fn resume(&self) {
        self.scheduler.resume();
    }

    pub fn trigger_now(&self) -> TriggerOutcome {
        self.scheduler.trigger_now()
    }

    pub async fn check_target(&self, identity: &str) -> Result<TargetCheck, TargetCheckError> {
        self.scheduler.check_target(identity).await
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn start(&self) {
        self.scheduler.start();
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }
}
