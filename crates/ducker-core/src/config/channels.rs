use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::defaults::*;

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub console: Option<ConsoleConfig>,
}

/// Line-oriented JSON console transport.
///
/// Reads one inbound event per line on stdin and prints every outbound
/// action as a JSON line on stdout. Group membership comes from
/// `participants`, keyed by group id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// The bot's own identifier.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,
    #[serde(default)]
    pub participants: HashMap<String, Vec<ParticipantEntry>>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_id: default_bot_id(),
            participants: HashMap::new(),
        }
    }
}

/// A known group member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_bot: bool,
}
