//! In-memory collaborators shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ducker_core::error::DuckerError;
use ducker_core::message::{
    normalize_id, ChatPresence, ContextInfo, ConversationMessage, ConversationRole,
    InboundMessage, JokeRecord, MediaKind, MediaRef, MessageBody, Participant,
};
use ducker_core::traits::{HistoryStore, Provider, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub const BOT: &str = "bot@s.whatsapp.net";
pub const GROUP: &str = "g1@g.us";

/// Everything a transport was asked to send, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat: String, text: String },
    Mention { chat: String, text: String, mentioned: String },
    Media { chat: String, caption: String, gif_loop: bool },
    Presence { chat: String, state: ChatPresence },
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    participants: HashMap<String, Vec<Participant>>,
    names: HashMap<String, String>,
    fail_mentions: bool,
    fail_uploads: bool,
    inbound: Mutex<Option<mpsc::Receiver<InboundMessage>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(mut self, group: &str, members: &[(&str, &str, bool)]) -> Self {
        let list = members
            .iter()
            .map(|(id, name, is_bot)| {
                if !name.is_empty() {
                    self.names.insert(id.to_string(), name.to_string());
                }
                Participant {
                    id: id.to_string(),
                    is_bot: *is_bot,
                }
            })
            .collect();
        self.participants.insert(group.to_string(), list);
        self
    }

    pub fn with_name(mut self, id: &str, name: &str) -> Self {
        self.names.insert(id.to_string(), name.to_string());
        self
    }

    pub fn failing_mentions(mut self) -> Self {
        self.fail_mentions = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Attach an inbound queue and return its sender.
    pub fn with_inbound(self) -> (Self, mpsc::Sender<InboundMessage>) {
        let (tx, rx) = mpsc::channel(16);
        *self.inbound.lock().unwrap() = Some(rx);
        (self, tx)
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Text of every text or mention message, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } | Sent::Mention { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Sent) {
        self.sent.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn own_id(&self) -> String {
        BOT.to_string()
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundMessage>, DuckerError> {
        self.inbound
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| DuckerError::Transport("no inbound queue".into()))
    }

    async fn send_text(&self, chat: &str, text: &str) -> Result<(), DuckerError> {
        self.push(Sent::Text {
            chat: chat.into(),
            text: text.into(),
        });
        Ok(())
    }

    async fn send_text_with_mention(
        &self,
        chat: &str,
        text: &str,
        mentioned_id: &str,
    ) -> Result<(), DuckerError> {
        if self.fail_mentions {
            return Err(DuckerError::Transport("mention rejected".into()));
        }
        self.push(Sent::Mention {
            chat: chat.into(),
            text: text.into(),
            mentioned: mentioned_id.into(),
        });
        Ok(())
    }

    async fn upload_media(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<MediaRef, DuckerError> {
        if self.fail_uploads {
            return Err(DuckerError::Media("upload rejected".into()));
        }
        Ok(MediaRef {
            kind,
            url: "test://media".into(),
            direct_path: "/media".into(),
            file_length: bytes.len() as u64,
            mimetype: Some("video/mp4".into()),
        })
    }

    async fn send_media(
        &self,
        chat: &str,
        _media: &MediaRef,
        caption: &str,
        gif_loop: bool,
    ) -> Result<(), DuckerError> {
        self.push(Sent::Media {
            chat: chat.into(),
            caption: caption.into(),
            gif_loop,
        });
        Ok(())
    }

    async fn send_presence(&self, chat: &str, state: ChatPresence) -> Result<(), DuckerError> {
        self.push(Sent::Presence {
            chat: chat.into(),
            state,
        });
        Ok(())
    }

    async fn group_participants(&self, group_id: &str) -> Result<Vec<Participant>, DuckerError> {
        self.participants
            .get(group_id)
            .cloned()
            .ok_or_else(|| DuckerError::Transport(format!("unknown group {group_id}")))
    }

    async fn resolve_display_name(&self, id: &str) -> String {
        self.names.get(id).cloned().unwrap_or_default()
    }

    async fn stop(&self) -> Result<(), DuckerError> {
        Ok(())
    }
}

/// Provider that replays queued results and records every prompt.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(error.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn generate(&self, prompt: &str) -> Result<String, DuckerError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(DuckerError::Provider(e)),
            None => Ok("ok".to_string()),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct MemoryHistory {
    pub messages: Mutex<Vec<ConversationMessage>>,
    pub jokes: Mutex<Vec<JokeRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_for(&self, key: &str) -> Vec<ConversationMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.key == key)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append_message(
        &self,
        key: &str,
        role: ConversationRole,
        text: &str,
    ) -> Result<(), DuckerError> {
        self.messages.lock().unwrap().push(ConversationMessage {
            key: key.to_string(),
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn load_recent(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DuckerError> {
        let all = self.messages_for(key);
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn append_joke(&self, text: &str) -> Result<(), DuckerError> {
        self.jokes.lock().unwrap().push(JokeRecord {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn load_recent_jokes(&self, limit: usize) -> Result<Vec<JokeRecord>, DuckerError> {
        let all = self.jokes.lock().unwrap().clone();
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DuckerError> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.timestamp >= cutoff);
        Ok((before - messages.len()) as u64)
    }
}

/// A group text message from `sender`.
pub fn group_text(sender: &str, text: &str) -> InboundMessage {
    message(GROUP, sender, true, MessageBody::Text { text: text.into() })
}

/// A group message that mentions `ids` explicitly.
pub fn group_mention(sender: &str, text: &str, ids: &[&str]) -> InboundMessage {
    message(
        GROUP,
        sender,
        true,
        MessageBody::ExtendedText {
            text: text.into(),
            context: Some(ContextInfo {
                mentioned_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
        },
    )
}

/// A group reply quoting `author`'s message `quoted`.
pub fn group_reply(sender: &str, text: &str, author: &str, quoted: &str) -> InboundMessage {
    message(
        GROUP,
        sender,
        true,
        MessageBody::ExtendedText {
            text: text.into(),
            context: Some(ContextInfo {
                quoted_author: Some(author.into()),
                quoted: Some(Box::new(MessageBody::Text {
                    text: quoted.into(),
                })),
                ..Default::default()
            }),
        },
    )
}

pub fn private_text(sender: &str, text: &str) -> InboundMessage {
    message(
        &normalize_id(sender),
        sender,
        false,
        MessageBody::Text { text: text.into() },
    )
}

pub fn message(chat: &str, sender: &str, is_group: bool, body: MessageBody) -> InboundMessage {
    InboundMessage {
        id: uuid::Uuid::new_v4(),
        chat: chat.into(),
        sender_id: sender.into(),
        sender_name: String::new(),
        is_group,
        from_me: false,
        timestamp: Utc::now(),
        body,
    }
}
