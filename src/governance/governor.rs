//! The decision engine for inbound group messages.

use super::mention::MentionDetector;
use super::rules::{lock, PauseState, RuleStore, SharedRules};
use crate::commands::{self, ParsedCommand, MARKER};
use ducker_core::message::InboundMessage;
use std::fmt;
use std::sync::Arc;

/// Why a group message was dropped without a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Marker present but no verb after it.
    NotACommand,
    NotPermitted,
    CoolingDown,
    AiDisabled,
    MentionRequired,
}

/// What to do with a group message.
#[derive(Debug)]
pub enum Verdict {
    /// The group is paused; drop everything.
    Paused,
    /// Hand off to the command router. No other policy applies.
    Command(ParsedCommand),
    Drop(DropReason),
    /// Run an AI turn. The permit holds the group's reply slot.
    Respond(ReplyPermit),
}

/// Exclusive right to send the next AI reply in a group.
///
/// While a permit is alive, other messages in the same group see the
/// cooldown as not elapsed. `commit` records the reply time. Dropping
/// without committing releases the slot and leaves the cooldown untouched.
pub struct ReplyPermit {
    rules: SharedRules,
    store: Arc<RuleStore>,
    committed: bool,
}

impl ReplyPermit {
    pub fn custom_prompt(&self) -> Option<String> {
        lock(&self.rules).custom_prompt.clone()
    }

    pub fn max_history_messages(&self) -> usize {
        lock(&self.rules).max_history_messages
    }

    /// The reply went out: start the cooldown window now.
    pub fn commit(mut self) {
        let mut rules = lock(&self.rules);
        rules.last_response_at = self.store.now();
        rules.reply_in_flight = false;
        self.committed = true;
    }
}

impl fmt::Debug for ReplyPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyPermit")
            .field("group_id", &lock(&self.rules).group_id)
            .field("committed", &self.committed)
            .finish()
    }
}

impl Drop for ReplyPermit {
    fn drop(&mut self) {
        if !self.committed {
            lock(&self.rules).reply_in_flight = false;
        }
    }
}

/// Applies pause state, permissions, cooldown, and mention policy to each
/// group message.
pub struct GroupGovernor {
    rules: Arc<RuleStore>,
    mentions: MentionDetector,
}

impl GroupGovernor {
    pub fn new(rules: Arc<RuleStore>, mentions: MentionDetector) -> Self {
        Self { rules, mentions }
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    /// Decide how to handle a group message.
    ///
    /// Every check and the reply reservation happen under the group's lock,
    /// so two concurrent messages cannot both pass the cooldown gate.
    pub fn evaluate(&self, msg: &InboundMessage) -> Verdict {
        let text = msg.text();
        // Mention detection needs no state; do it before taking the lock.
        let addressed = self.mentions.addresses_bot(&msg.body);

        let shared = self.rules.get(&msg.chat);
        let mut rules = lock(&shared);
        let now = self.rules.now();

        // --- 1. PAUSE ---
        if rules.check_pause(now) == PauseState::Paused {
            return Verdict::Paused;
        }

        // --- 2. COMMANDS ---
        if text.starts_with(MARKER) {
            return match commands::parse(text) {
                Some(parsed) => Verdict::Command(parsed),
                None => Verdict::Drop(DropReason::NotACommand),
            };
        }

        // --- 3. PERMISSION ---
        if !rules.is_permitted(&msg.sender_id) {
            return Verdict::Drop(DropReason::NotPermitted);
        }

        // --- 4. COOLDOWN ---
        if rules.reply_in_flight || !rules.cooldown_elapsed(now) {
            return Verdict::Drop(DropReason::CoolingDown);
        }

        // --- 5. AI ENABLED ---
        if !rules.ai_enabled {
            return Verdict::Drop(DropReason::AiDisabled);
        }

        // --- 6. MENTION POLICY ---
        if !addressed && rules.require_mention {
            return Verdict::Drop(DropReason::MentionRequired);
        }

        rules.reply_in_flight = true;
        drop(rules);
        Verdict::Respond(ReplyPermit {
            rules: shared,
            store: Arc::clone(&self.rules),
            committed: false,
        })
    }
}
