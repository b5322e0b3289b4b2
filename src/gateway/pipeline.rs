//! Per-message handling: filtering, governance, commands, and AI turns.

use super::prompt::{format_conversation_history, group_prompt, private_prompt};
use super::Gateway;
use crate::commands::{self, CommandContext, ParsedCommand, MARKER};
use crate::governance::{ReplyPermit, Verdict};
use ducker_core::message::{
    normalize_id, user_part, ChatPresence, ConversationMessage, ConversationRole, InboundMessage,
};
use ducker_core::sanitize::truncate;
use tracing::{debug, error, info, warn};

pub(super) const AI_NOT_CONFIGURED: &str =
    "⚠️ The AI backend is not configured. Set an API key to enable replies.";
const GROUP_AI_ERROR: &str = "❌ Error processing request in group.";
const PRIVATE_AI_ERROR: &str = "❌ Error processing your request. Try again later.";

const GROUP_REPLY_BOUND: usize = 500;
const PRIVATE_REPLY_BOUND: usize = 4000;

impl Gateway {
    /// Process a single inbound message end to end.
    pub(super) async fn handle_message(&self, msg: InboundMessage) {
        // --- 1. OWN MESSAGES ---
        if msg.from_me || normalize_id(&msg.sender_id) == self.own_id {
            return;
        }

        // --- 2. EMPTY TEXT ---
        let text = msg.text();
        if text.is_empty() {
            debug!("[{}] ignoring {} without text", msg.chat, msg.body.describe());
            return;
        }

        info!(
            "[{}] {} says: {}",
            msg.chat,
            sender_label(&msg),
            truncate(text, 80, "...")
        );

        // --- 3. ROUTE ---
        if msg.is_group {
            self.handle_group(&msg).await;
        } else {
            self.handle_private(&msg).await;
        }
    }

    async fn handle_group(&self, msg: &InboundMessage) {
        match self.governor.evaluate(msg) {
            Verdict::Paused => debug!("[{}] group paused, dropping message", msg.chat),
            Verdict::Command(parsed) => self.run_command(msg, &parsed).await,
            Verdict::Drop(reason) => {
                debug!("[{}] no reply to {}: {reason:?}", msg.chat, msg.sender_id)
            }
            Verdict::Respond(permit) => self.group_ai_turn(msg, permit).await,
        }
    }

    async fn handle_private(&self, msg: &InboundMessage) {
        let text = msg.text();
        match commands::parse(text) {
            Some(parsed) => self.run_command(msg, &parsed).await,
            // A lone marker is neither a command nor a question.
            None if text.starts_with(MARKER) => {}
            None => self.private_ai_turn(msg).await,
        }
    }

    async fn run_command(&self, msg: &InboundMessage, parsed: &ParsedCommand) {
        let ctx = CommandContext {
            msg,
            transport: self.transport.as_ref(),
            provider: self.provider.as_deref(),
            history: self.history.as_ref(),
            pauses: &self.pauses,
            prompts: &self.prompts,
            media_dir: &self.media_dir,
        };
        commands::handle(parsed, &ctx).await;
    }

    /// Group reply. The permit keeps other messages in this group cooling
    /// down until it is committed or dropped.
    async fn group_ai_turn(&self, msg: &InboundMessage, permit: ReplyPermit) {
        let Some(provider) = self.provider.as_deref() else {
            self.send_text(&msg.chat, AI_NOT_CONFIGURED).await;
            return;
        };
        let key = msg.conversation_key();
        let text = msg.text();

        // --- 1. TYPING ---
        self.send_presence(&msg.chat, ChatPresence::Composing).await;

        // --- 2. CONTEXT ---
        let history = self
            .load_history(&key, permit.max_history_messages())
            .await;

        // --- 3. PERSIST INBOUND ---
        let speaker = user_part(&msg.sender_id);
        self.append(&key, ConversationRole::User, &format!("{speaker}: {text}"))
            .await;

        // --- 4. GENERATE ---
        let system = permit
            .custom_prompt()
            .unwrap_or_else(|| self.prompts.group.clone());
        let history_text = format_conversation_history(&history, &self.persona);
        let prompt = group_prompt(&system, &history_text, speaker, text);

        let reply = match provider.generate(&prompt).await {
            Ok(r) => truncate(r.trim(), GROUP_REPLY_BOUND, "..."),
            Err(e) => {
                error!("[{}] group AI turn failed: {e}", msg.chat);
                self.send_text(&msg.chat, GROUP_AI_ERROR).await;
                self.send_presence(&msg.chat, ChatPresence::Paused).await;
                // Dropping the permit leaves the cooldown untouched.
                return;
            }
        };

        // --- 5. PERSIST REPLY, START COOLDOWN, SEND ---
        self.append(&key, ConversationRole::Assistant, &reply).await;
        permit.commit();
        self.send_text(&msg.chat, &format!("🤖 {reply}")).await;
        self.send_presence(&msg.chat, ChatPresence::Paused).await;

        info!(
            "[{}] replied to {} ({} context messages, {} chars)",
            msg.chat,
            msg.sender_id,
            history.len(),
            reply.chars().count()
        );
    }

    async fn private_ai_turn(&self, msg: &InboundMessage) {
        let Some(provider) = self.provider.as_deref() else {
            self.send_text(&msg.chat, AI_NOT_CONFIGURED).await;
            return;
        };
        let key = msg.conversation_key();
        let text = msg.text();

        self.send_presence(&msg.chat, ChatPresence::Composing).await;
        let history = self
            .load_history(&key, self.memory_config.max_context_messages)
            .await;
        self.append(&key, ConversationRole::User, text).await;

        let history_text = format_conversation_history(&history, &self.persona);
        let prompt = private_prompt(&self.prompts.private, &history_text, text);

        let reply = match provider.generate(&prompt).await {
            Ok(r) => truncate(r.trim(), PRIVATE_REPLY_BOUND, "\n\n... (response truncated)"),
            Err(e) => {
                error!("[{}] private AI turn failed: {e}", msg.chat);
                self.send_presence(&msg.chat, ChatPresence::Paused).await;
                self.send_text(&msg.chat, PRIVATE_AI_ERROR).await;
                return;
            }
        };

        self.append(&key, ConversationRole::Assistant, &reply).await;
        self.send_text(&msg.chat, &format!("🤖 {reply}")).await;
        self.send_presence(&msg.chat, ChatPresence::Paused).await;
    }

    async fn load_history(&self, key: &str, limit: usize) -> Vec<ConversationMessage> {
        self.history.load_recent(key, limit).await.unwrap_or_else(|e| {
            warn!("history unavailable for {key}, continuing without it: {e}");
            Vec::new()
        })
    }

    async fn append(&self, key: &str, role: ConversationRole, text: &str) {
        if let Err(e) = self.history.append_message(key, role, text).await {
            warn!("failed to save {} message for {key}: {e}", role.as_str());
        }
    }

    async fn send_text(&self, chat: &str, text: &str) {
        if let Err(e) = self.transport.send_text(chat, text).await {
            error!("failed to send message to {chat}: {e}");
        }
    }

    async fn send_presence(&self, chat: &str, state: ChatPresence) {
        if let Err(e) = self.transport.send_presence(chat, state).await {
            debug!("presence update failed in {chat}: {e}");
        }
    }
}

fn sender_label(msg: &InboundMessage) -> String {
    if msg.sender_name.is_empty() {
        user_part(&msg.sender_id).to_string()
    } else {
        format!("{} ({})", msg.sender_name, user_part(&msg.sender_id))
    }
}
