//! Console transport: JSON lines over stdin/stdout.
//!
//! Each stdin line is one inbound event (`InboundMessage` as JSON). Every
//! outbound action is printed to stdout as one JSON line, so a session can
//! be scripted and its output diffed. Group membership and contact names
//! come from `[channel.console]` in the config, plus the display names
//! senders announce on their own messages.

mod format;
mod transport;


pub use format::{sanitize_for_whatsapp, OutboundEvent};

use ducker_core::config::ConsoleConfig;
use ducker_core::message::normalize_id;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Console transport for local operation and scripted sessions.
pub struct ConsoleTransport {
    pub(super) config: ConsoleConfig,
    /// Known display names by normalized identifier.
    pub(super) names: Arc<Mutex<HashMap<String, String>>>,
    /// Stdin reader task, set after `start()`.
    pub(super) reader: Mutex<Option<JoinHandle<()>>>,
    pub(super) uploads: AtomicU64,
}

impl ConsoleTransport {
    /// Create a console transport from config.
    pub fn new(config: ConsoleConfig) -> Self {
        let names = config
            .participants
            .values()
            .flatten()
            .filter(|p| !p.name.is_empty())
            .map(|p| (normalize_id(&p.id), p.name.clone()))
            .collect();
        Self {
            config,
            names: Arc::new(Mutex::new(names)),
            reader: Mutex::new(None),
            uploads: AtomicU64::new(0),
        }
    }

    /// Remember the display name a sender announced.
    pub(super) fn remember_name(names: &Mutex<HashMap<String, String>>, id: &str, name: &str) {
        if name.trim().is_empty() {
            return;
        }
        if let Ok(mut map) = names.lock() {
            map.entry(normalize_id(id))
                .or_insert_with(|| name.trim().to_string());
        }
    }
}
