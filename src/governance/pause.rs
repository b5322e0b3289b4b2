//! Timed self-pause: announcement, countdown, pause window, auto-resume.

use super::rules::{lock, PauseState, RuleStore};
use ducker_core::traits::Transport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Countdown ticks announced before the pause takes hold.
const COUNTDOWN_TICKS: u32 = 5;
const TICK: Duration = Duration::from_secs(1);

/// Outcome of a pause request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseRequest {
    /// The sequence is running in the background.
    Started { minutes: u32 },
    AlreadyPaused { remaining_minutes: i64 },
    /// A countdown for this group has not finished yet.
    InProgress,
}

/// A live sequence in the `running` map.
struct Sequence {
    generation: u64,
    token: CancellationToken,
    /// Set once the countdown is over and the pause window has begun.
    in_window: bool,
}

/// Runs one detached pause sequence per group.
///
/// Each sequence owns a cancellation token. A manual unpause cancels it,
/// which silences the remaining countdown and the resume announcement.
pub struct PauseScheduler {
    rules: Arc<RuleStore>,
    transport: Arc<dyn Transport>,
    running: Mutex<HashMap<String, Sequence>>,
    generation: AtomicU64,
}

impl PauseScheduler {
    pub fn new(rules: Arc<RuleStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            rules,
            transport,
            running: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Start the sequence for `group_id` unless the group is already paused
    /// or counting down. Returns without waiting for the sequence.
    pub fn request(self: &Arc<Self>, group_id: &str, minutes: u32) -> PauseRequest {
        let now = self.rules.now();
        let paused = self.rules.update(group_id, |r| {
            (r.check_pause(now) == PauseState::Paused).then(|| r.remaining_pause_minutes(now))
        });
        if let Some(remaining_minutes) = paused {
            return PauseRequest::AlreadyPaused { remaining_minutes };
        }

        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut running = lock(&self.running);
            match running.get(group_id) {
                Some(seq) if !seq.in_window => return PauseRequest::InProgress,
                // The group is active, so a sequence still waiting out its
                // window was lifted behind its back.
                Some(seq) => {
                    seq.token.cancel();
                    info!("group {group_id}: dropping stale pause sequence");
                }
                None => {}
            }
            running.insert(
                group_id.to_string(),
                Sequence {
                    generation,
                    token: token.clone(),
                    in_window: false,
                },
            );
        }

        let scheduler = Arc::clone(self);
        let group = group_id.to_string();
        tokio::spawn(async move {
            scheduler.run_sequence(&group, minutes, generation, &token).await;
            scheduler.finish(&group, generation);
        });

        info!("group {group_id}: self-pause requested for {minutes} minute(s)");
        PauseRequest::Started { minutes }
    }

    /// Manual unpause. Also aborts a sequence still counting down or waiting.
    pub fn cancel(&self, group_id: &str) {
        self.rules.unpause(group_id);
        if let Some(seq) = lock(&self.running).remove(group_id) {
            seq.token.cancel();
            info!("group {group_id}: pause sequence cancelled");
        }
    }

    /// Whether a sequence is live for `group_id`.
    pub fn is_running(&self, group_id: &str) -> bool {
        lock(&self.running).contains_key(group_id)
    }

    async fn run_sequence(
        &self,
        group_id: &str,
        minutes: u32,
        generation: u64,
        token: &CancellationToken,
    ) {
        self.announce(
            group_id,
            &format!(
                "⚠️ *SELF-DESTRUCT ACTIVATED*\n\nThe bot will be paused for *{minutes} minute(s)*.\n\nStarting {COUNTDOWN_TICKS}-second countdown..."
            ),
        )
        .await;

        for tick in (1..=COUNTDOWN_TICKS).rev() {
            tokio::select! {
                _ = tokio::time::sleep(TICK) => {}
                _ = token.cancelled() => return,
            }
            self.announce(group_id, &format!("💥 {tick}")).await;
        }

        if token.is_cancelled() {
            return;
        }
        let duration = Duration::from_secs(u64::from(minutes) * 60);
        let until = self.rules.pause_for(group_id, duration);
        if let Some(seq) = lock(&self.running)
            .get_mut(group_id)
            .filter(|seq| seq.generation == generation)
        {
            seq.in_window = true;
        }
        self.announce(
            group_id,
            "💥 *Bot paused!*\n\nThe bot will stay quiet for a while.",
        )
        .await;

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = token.cancelled() => return,
        }

        // Someone else may have lifted the pause meanwhile (lazy expiry).
        let now = self.rules.now();
        let resumed = self.rules.update(group_id, |r| {
            if r.paused && r.paused_until.is_some_and(|u| now >= u && u == until) {
                r.unpause();
                true
            } else {
                false
            }
        });
        if resumed {
            self.announce(
                group_id,
                "✅ *Bot reactivated!*\n\nSelf-destruct complete. The bot is working normally again.",
            )
            .await;
            info!("group {group_id}: pause finished, bot reactivated");
        }
    }

    fn finish(&self, group_id: &str, generation: u64) {
        let mut running = lock(&self.running);
        if running
            .get(group_id)
            .is_some_and(|seq| seq.generation == generation)
        {
            running.remove(group_id);
        }
    }

    async fn announce(&self, group_id: &str, text: &str) {
        if let Err(e) = self.transport.send_text(group_id, text).await {
            warn!("group {group_id}: pause announcement failed: {e}");
        }
    }
}
