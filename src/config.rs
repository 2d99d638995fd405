use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::monitor::scheduler::SchedulerSettings;

pub const ENV_PREFIX: &str = "LISTING_MONITOR_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: String,
    pub log_dir: String,
    pub listen_address: String,
    pub check_interval_seconds: u64,
    pub inter_check_delay_ms: u64,
    pub probe_timeout_seconds: u64,
    /// Hex-encoded AES-256 key; when set the endpoint token is sealed at rest.
    pub credential_key: Option<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialAppConfig {
    data_dir: Option<String>,
    log_dir: Option<String>,
    listen_address: Option<String>,
    check_interval_seconds: Option<u64>,
    inter_check_delay_ms: Option<u64>,
    probe_timeout_seconds: Option<u64>,
    credential_key: Option<String>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_listen_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_dir: default_log_dir(),
            listen_address: default_listen_address(),
            check_interval_seconds: 30,
            inter_check_delay_ms: 1000,
            probe_timeout_seconds: 10,
            credential_key: None,
        }
    }
}

impl AppConfig {
    /// File values first, then `.env` and `LISTING_MONITOR_*` variables override them.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config: PartialAppConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let path = Path::new(path_str);
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            Some(path_str) => return Err(format!("Config file not found: {path_str}")),
            None => PartialAppConfig::default(),
        };

        let env_config: PartialAppConfig = envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::merge(file_config, env_config)
    }

    fn merge(file: PartialAppConfig, env: PartialAppConfig) -> Result<Self, String> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            data_dir: env.data_dir.or(file.data_dir).unwrap_or(defaults.data_dir),
            log_dir: env.log_dir.or(file.log_dir).unwrap_or(defaults.log_dir),
            listen_address: env
                .listen_address
                .or(file.listen_address)
                .unwrap_or(defaults.listen_address),
            check_interval_seconds: env
                .check_interval_seconds
                .or(file.check_interval_seconds)
                .unwrap_or(defaults.check_interval_seconds),
            inter_check_delay_ms: env
                .inter_check_delay_ms
                .or(file.inter_check_delay_ms)
                .unwrap_or(defaults.inter_check_delay_ms),
            probe_timeout_seconds: env
                .probe_timeout_seconds
                .or(file.probe_timeout_seconds)
                .unwrap_or(defaults.probe_timeout_seconds),
            credential_key: env
                .credential_key
                .or(file.credential_key)
                .filter(|k| !k.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.check_interval_seconds == 0 {
            return Err("check_interval_seconds must be at least 1".to_string());
        }
        if self.probe_timeout_seconds == 0 {
            return Err("probe_timeout_seconds must be at least 1".to_string());
        }
        if let Some(key) = &self.credential_key {
            let key = key.trim();
            if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("credential_key must be 64 hex characters (32 bytes)".to_string());
            }
        }
        Ok(())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_secs(self.check_interval_seconds),
            inter_check_delay: Duration::from_millis(self.inter_check_delay_ms),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}
