//! # Relay Configuration
//!
//! Everything the process needs at startup lives in one TOML file:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//!
//! [mqtt]
//! broker_url = "mqtt://broker.hivemq.com"
//! topic = "/internet-controlled-car/car/control"
//! keep_alive_secs = 60
//! reconnect_delay_ms = 1000
//! request_capacity = 10
//!
//! [relay]
//! payload_format = "command"   # or "command_with_speed"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! The file is looked up at `$CARRELAY_CONFIG` or, failing that, at
//! `<config dir>/carrelay/config.toml`. A missing file is created with the
//! defaults above so a first start works out of the box; missing keys in an
//! existing file fall back to the same defaults.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::mqtt::MqttConfig;
use crate::relay::PayloadFormat;

pub const CONFIG_ENV_VAR: &str = "CARRELAY_CONFIG";
const CONFIG_DIR: &str = "carrelay";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub mqtt: MqttConfig,
    pub relay: CommandConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub payload_format: PayloadFormat,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl RelayConfig {
    /// Resolves the config file path from the environment or the user's config dir.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine the user config directory"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse relay config: {}", e))
    }

    /// Reads the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check config file {}: {}", path.display(), e))?;

        if !exists {
            let config = Self::default();
            config.save(path).await?;
            info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize relay config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }
}
