mod channels;
mod defaults;
mod prompts;
mod providers;

#[cfg(test)]
mod tests;

pub use channels::*;
pub use prompts::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DuckerError;
use defaults::*;

/// Top-level Ducker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ducker: DuckerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuckerConfig {
    /// Persona name used in history formatting.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DuckerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// History store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// History cap for private conversations.
    #[serde(default = "default_max_context")]
    pub max_context_messages: usize,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_hours: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_context_messages: default_max_context(),
            retention_days: default_retention_days(),
            sweep_interval_hours: default_sweep_interval(),
        }
    }
}

/// Group governance defaults and mention heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Names the bot answers to when not explicitly mentioned.
    #[serde(default = "default_bot_aliases")]
    pub bot_aliases: Vec<String>,
    /// Bare alias matches only count in texts shorter than this.
    #[serde(default = "default_mention_length_bound")]
    pub mention_length_bound: usize,
    #[serde(default = "default_max_history")]
    pub max_history_messages: usize,
    #[serde(default = "default_cooldown_secs")]
    pub response_cooldown_secs: u64,
    #[serde(default = "default_true")]
    pub require_mention: bool,
    #[serde(default = "default_true")]
    pub ai_enabled: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            bot_aliases: default_bot_aliases(),
            mention_length_bound: default_mention_length_bound(),
            max_history_messages: default_max_history(),
            response_cooldown_secs: default_cooldown_secs(),
            require_mention: true,
            ai_enabled: true,
        }
    }
}

/// Local media for action commands.
///
/// Each action reads a random `.mp4` from `{dir}/{category}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub dir: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Create the `data/`, `logs/` and `prompts/` subdirectories of the data dir.
pub fn ensure_layout(data_dir: &str) -> Result<(), DuckerError> {
    let dir = shellexpand(data_dir);
    let base = Path::new(&dir);
    for sub in &["data", "logs", "prompts"] {
        std::fs::create_dir_all(base.join(sub))?;
    }
    Ok(())
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, DuckerError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| DuckerError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    parse(&content)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, DuckerError> {
    let config: Config = toml::from_str(content)
        .map_err(|e| DuckerError::Config(format!("failed to parse config: {}", e)))?;

    if config.governance.response_cooldown_secs == 0 {
        return Err(DuckerError::Config(
            "governance.response_cooldown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(config)
}
