use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_ARCHITECT_CONFIG: &str = "ARCHITECT_CONFIG";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_OBSERVE_REQUESTED_STATUS: bool = true;
const DEFAULT_OBSERVE_ACTUAL_STATUS: bool = true;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ArchitectConfig {
    #[serde(default)]
    pub logging: LoggingConfigToml,
    #[serde(default)]
    pub watcher: WatcherConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfigToml {
    /// `tracing_subscriber` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfigToml {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatcherConfigToml {
    #[serde(default = "default_observe_requested_status")]
    pub observe_requested_status: bool,
    #[serde(default = "default_observe_actual_status")]
    pub observe_actual_status: bool,
}

impl Default for WatcherConfigToml {
    fn default() -> Self {
        Self {
            observe_requested_status: default_observe_requested_status(),
            observe_actual_status: default_observe_actual_status(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherRuntimeConfig {
    pub observe_requested_status: bool,
    pub observe_actual_status: bool,
}

impl ArchitectConfig {
    pub fn log_filter(&self) -> &str {
        &self.logging.filter
    }

    pub fn watcher_runtime(&self) -> WatcherRuntimeConfig {
        WatcherRuntimeConfig {
            observe_requested_status: self.watcher.observe_requested_status,
            observe_actual_status: self.watcher.observe_actual_status,
        }
    }
}

pub fn load_from_env() -> Result<ArchitectConfig, ConfigError> {
    let path = config_path_from_env()?;
    load_from_path(path)
}

/// A missing file yields the defaults; nothing is written back.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ArchitectConfig, ConfigError> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ArchitectConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read ARCHITECT_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config = parse_config(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse ARCHITECT_CONFIG from {}: {err}",
            path.display()
        ))
    })?;
    normalize_config(&mut config);
    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<ArchitectConfig, toml::de::Error> {
    toml::from_str(raw)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home.join(".config").join("architect").join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_ARCHITECT_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "ARCHITECT_CONFIG contained invalid UTF-8",
        )),
    }
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn normalize_config(config: &mut ArchitectConfig) {
    let filter = config.logging.filter.trim();
    config.logging.filter = if filter.is_empty() {
        default_log_filter()
    } else {
        filter.to_owned()
    };
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

fn default_observe_requested_status() -> bool {
    DEFAULT_OBSERVE_REQUESTED_STATUS
}

fn default_observe_actual_status() -> bool {
    DEFAULT_OBSERVE_ACTUAL_STATUS
}
