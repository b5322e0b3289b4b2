//! Does this message address the bot?

use ducker_core::config::GovernanceConfig;
use ducker_core::message::{normalize_id, MessageBody};

/// Detects mentions of the bot and replies to the bot's messages.
#[derive(Debug, Clone)]
pub struct MentionDetector {
    own_id: String,
    aliases: Vec<String>,
    length_bound: usize,
}

impl MentionDetector {
    pub fn new(own_id: &str, aliases: &[String], length_bound: usize) -> Self {
        Self {
            own_id: normalize_id(own_id),
            aliases: aliases
                .iter()
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
            length_bound,
        }
    }

    pub fn from_config(own_id: &str, cfg: &GovernanceConfig) -> Self {
        Self::new(own_id, &cfg.bot_aliases, cfg.mention_length_bound)
    }

    fn is_own(&self, id: &str) -> bool {
        normalize_id(id) == self.own_id
    }

    /// Explicit mention of the bot on any message shape, or an alias in the text.
    ///
    /// `@alias` matches anywhere. A bare alias only counts in texts shorter
    /// than the length bound, so long free-form messages that happen to
    /// contain the word are not treated as addressing the bot.
    pub fn is_mentioned(&self, body: &MessageBody, plain_text: &str) -> bool {
        if body.mentioned_ids().iter().any(|id| self.is_own(id)) {
            return true;
        }

        let text = plain_text.to_lowercase();
        let short = text.chars().count() < self.length_bound;
        self.aliases
            .iter()
            .any(|alias| text.contains(&format!("@{alias}")) || (short && text.contains(alias)))
    }

    /// The message replies to something the bot said.
    pub fn is_quoting_bot(&self, body: &MessageBody) -> bool {
        body.quoted_author().is_some_and(|author| self.is_own(author))
    }

    /// Either of the above.
    pub fn addresses_bot(&self, body: &MessageBody) -> bool {
        self.is_mentioned(body, body.plain_text()) || self.is_quoting_bot(body)
    }
}
