//! Prompt assembly for AI turns.

use ducker_core::message::{ConversationMessage, ConversationRole};

/// Render stored history as `[HH:MM] Speaker: text` lines.
pub(super) fn format_conversation_history(messages: &[ConversationMessage], persona: &str) -> String {
    if messages.is_empty() {
        return "No previous conversation.".to_string();
    }
    let mut out = String::from("Conversation history:\n");
    for m in messages {
        let speaker = match m.role {
            ConversationRole::User => "User",
            ConversationRole::Assistant => persona,
        };
        out.push_str(&format!(
            "[{}] {speaker}: {}\n",
            m.timestamp.format("%H:%M"),
            m.text
        ));
    }
    out
}

pub(super) fn group_prompt(system: &str, history: &str, user: &str, text: &str) -> String {
    format!(
        "{system}\n\n{history}\n\n**{user}:** {text}\n\n\
         Reply DIRECTLY, SHORT, and NATURALLY. Get to the point and do not force topics."
    )
}

pub(super) fn private_prompt(system: &str, history: &str, text: &str) -> String {
    format!("{system}\n\n{history}\n\nCurrent user message: {text}")
}
