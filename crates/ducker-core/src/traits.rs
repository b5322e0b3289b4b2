use crate::{
    error::DuckerError,
    message::{
        ChatPresence, ConversationMessage, ConversationRole, InboundMessage, JokeRecord,
        MediaKind, MediaRef, Participant,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// AI backend trait.
///
/// A single-shot text generator. The core never streams.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Generate a reply for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, DuckerError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging transport trait.
///
/// Wraps the platform connection: inbound events, outbound sends, media
/// upload, presence, and group/contact lookups.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name.
    fn name(&self) -> &str;

    /// The bot's own identifier on the platform.
    fn own_id(&self) -> String;

    /// Start listening for inbound events.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<InboundMessage>, DuckerError>;

    async fn send_text(&self, chat: &str, text: &str) -> Result<(), DuckerError>;

    /// Send text that tags `mentioned_id` so the platform notifies them.
    async fn send_text_with_mention(
        &self,
        chat: &str,
        text: &str,
        mentioned_id: &str,
    ) -> Result<(), DuckerError>;

    async fn upload_media(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<MediaRef, DuckerError>;

    /// Send previously uploaded media. `gif_loop` asks the client to play a
    /// video as an animated loop.
    async fn send_media(
        &self,
        chat: &str,
        media: &MediaRef,
        caption: &str,
        gif_loop: bool,
    ) -> Result<(), DuckerError>;

    async fn send_presence(&self, chat: &str, state: ChatPresence) -> Result<(), DuckerError>;

    async fn group_participants(&self, group_id: &str) -> Result<Vec<Participant>, DuckerError>;

    /// Best-known display name for an identifier. Empty when unknown.
    async fn resolve_display_name(&self, id: &str) -> String;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), DuckerError>;
}

/// Append-only conversation and joke log.
///
/// Reads always come back oldest-first.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_message(
        &self,
        key: &str,
        role: ConversationRole,
        text: &str,
    ) -> Result<(), DuckerError>;

    async fn load_recent(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DuckerError>;

    async fn append_joke(&self, text: &str) -> Result<(), DuckerError>;

    async fn load_recent_jokes(&self, limit: usize) -> Result<Vec<JokeRecord>, DuckerError>;

    /// Delete records older than `cutoff`. Returns the number removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DuckerError>;
}
