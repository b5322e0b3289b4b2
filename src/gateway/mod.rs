//! Gateway: the main event loop connecting the transport, the governance
//! engine, commands, the AI provider, and history.

mod pipeline;
mod prompt;

#[cfg(test)]
mod tests;

use crate::governance::{GroupGovernor, MentionDetector, PauseScheduler, RuleDefaults, RuleStore};
use ducker_core::{
    clock::Clock,
    config::{shellexpand, Config, MemoryConfig, Prompts},
    message::normalize_id,
    traits::{HistoryStore, Provider, Transport},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The central gateway that routes inbound messages.
pub struct Gateway {
    pub(super) transport: Arc<dyn Transport>,
    /// `None` when no backend is configured. AI paths answer with a fixed notice.
    pub(super) provider: Option<Arc<dyn Provider>>,
    pub(super) history: Arc<dyn HistoryStore>,
    pub(super) governor: GroupGovernor,
    pub(super) pauses: Arc<PauseScheduler>,
    pub(super) prompts: Prompts,
    /// Name the bot goes by in formatted history.
    pub(super) persona: String,
    pub(super) media_dir: PathBuf,
    pub(super) memory_config: MemoryConfig,
    pub(super) clock: Arc<dyn Clock>,
    /// Normalized own identifier.
    pub(super) own_id: String,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        transport: Arc<dyn Transport>,
        provider: Option<Arc<dyn Provider>>,
        history: Arc<dyn HistoryStore>,
        config: &Config,
        prompts: Prompts,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let own_id = normalize_id(&transport.own_id());
        let rules = Arc::new(RuleStore::new(
            RuleDefaults::from(&config.governance),
            Arc::clone(&clock),
        ));
        let governor = GroupGovernor::new(
            Arc::clone(&rules),
            MentionDetector::from_config(&own_id, &config.governance),
        );
        let pauses = Arc::new(PauseScheduler::new(rules, Arc::clone(&transport)));
        Self {
            transport,
            provider,
            history,
            governor,
            pauses,
            prompts,
            persona: config.ducker.name.clone(),
            media_dir: PathBuf::from(shellexpand(&config.media.dir)),
            memory_config: config.memory.clone(),
            clock,
            own_id,
        }
    }

    /// Per-group rules, for admin-style changes.
    pub fn rules(&self) -> &Arc<RuleStore> {
        self.governor.rules()
    }

    /// Manually lift a group's pause, cancelling any running sequence.
    pub fn unpause_group(&self, group_id: &str) {
        self.pauses.cancel(group_id);
    }

    /// Run the main event loop until the transport closes or ctrl-c.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Ducker gateway running | transport: {} | provider: {} | own id: {}",
            self.transport.name(),
            self.provider.as_ref().map(|p| p.name()).unwrap_or("none"),
            self.own_id
        );

        let mut rx = self.transport.start().await?;

        let sweep_handle = {
            let history = Arc::clone(&self.history);
            let clock = Arc::clone(&self.clock);
            let cfg = self.memory_config.clone();
            tokio::spawn(async move {
                Self::retention_loop(history, clock, cfg).await;
            })
        };

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                incoming = rx.recv() => match incoming {
                    Some(msg) => {
                        let gw = Arc::clone(&self);
                        tokio::spawn(async move {
                            gw.handle_message(msg).await;
                        });
                    }
                    None => {
                        info!("transport closed its inbound stream");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(&sweep_handle).await;
        Ok(())
    }

    /// Delete history older than the retention window, periodically.
    async fn retention_loop(
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
        cfg: MemoryConfig,
    ) {
        let interval = Duration::from_secs(cfg.sweep_interval_hours.max(1) * 3600);
        loop {
            Self::retention_sweep(history.as_ref(), clock.as_ref(), cfg.retention_days).await;
            tokio::time::sleep(interval).await;
        }
    }

    pub(super) async fn retention_sweep(
        history: &dyn HistoryStore,
        clock: &dyn Clock,
        retention_days: i64,
    ) -> u64 {
        let cutoff = clock.now() - chrono::Duration::days(retention_days.max(0));
        match history.purge_older_than(cutoff).await {
            Ok(0) => 0,
            Ok(n) => {
                info!("retention sweep removed {n} records older than {cutoff}");
                n
            }
            Err(e) => {
                warn!("retention sweep failed: {e}");
                0
            }
        }
    }

    async fn shutdown(&self, sweep_handle: &tokio::task::JoinHandle<()>) {
        info!("Shutting down...");
        sweep_handle.abort();
        if let Err(e) = self.transport.stop().await {
            warn!("failed to stop transport {}: {e}", self.transport.name());
        }
        info!("Shutdown complete.");
    }
}
