use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound chat event delivered by a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Chat identifier: the group id for group messages, the peer id otherwise.
    pub chat: String,
    /// Platform-specific sender identifier (may carry a device suffix).
    pub sender_id: String,
    /// Display name the sender chose for themselves.
    #[serde(default)]
    pub sender_name: String,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
    /// Echo of a message the bot itself sent.
    #[serde(default)]
    pub from_me: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub body: MessageBody,
}

/// The shapes a message can arrive in. Each media shape carries its own
/// optional context block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    Text {
        text: String,
    },
    ExtendedText {
        text: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    Image {
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    Video {
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    Document {
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    Other,
}

/// Reply and mention metadata attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextInfo {
    #[serde(default)]
    pub mentioned_ids: Vec<String>,
    /// Author of the quoted message, if this is a reply.
    #[serde(default)]
    pub quoted_author: Option<String>,
    #[serde(default)]
    pub quoted: Option<Box<MessageBody>>,
}

impl MessageBody {
    fn context(&self) -> Option<&ContextInfo> {
        match self {
            Self::ExtendedText { context, .. }
            | Self::Image { context, .. }
            | Self::Video { context, .. }
            | Self::Document { context, .. } => context.as_ref(),
            Self::Text { .. } | Self::Other => None,
        }
    }

    /// Text the user typed: the body of text messages or a media caption.
    pub fn plain_text(&self) -> &str {
        match self {
            Self::Text { text } | Self::ExtendedText { text, .. } => text,
            Self::Image { caption, .. }
            | Self::Video { caption, .. }
            | Self::Document { caption, .. } => caption.as_deref().unwrap_or_default(),
            Self::Other => "",
        }
    }

    /// Explicitly mentioned identifiers, in the order the platform listed them.
    pub fn mentioned_ids(&self) -> &[String] {
        self.context()
            .map(|c| c.mentioned_ids.as_slice())
            .unwrap_or_default()
    }

    /// Author of the quoted message, if any.
    pub fn quoted_author(&self) -> Option<&str> {
        self.context().and_then(|c| c.quoted_author.as_deref())
    }

    /// Content of the quoted message, if any.
    pub fn quoted(&self) -> Option<&MessageBody> {
        self.context().and_then(|c| c.quoted.as_deref())
    }

    /// Readable text for any shape, with placeholders for media without a caption.
    pub fn describe(&self) -> String {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|s| !s.is_empty()).map(String::from);
        match self {
            Self::Text { text } | Self::ExtendedText { text, .. } if !text.is_empty() => {
                text.clone()
            }
            Self::Image { caption, .. } => {
                non_empty(caption).unwrap_or_else(|| "[Image message]".to_string())
            }
            Self::Video { caption, .. } => {
                non_empty(caption).unwrap_or_else(|| "[Video message]".to_string())
            }
            Self::Document { caption, title, .. } => non_empty(caption)
                .or_else(|| non_empty(title).map(|t| format!("[Document: {t}]")))
                .unwrap_or_else(|| "[Document message]".to_string()),
            _ => "[Message without text]".to_string(),
        }
    }
}

impl InboundMessage {
    /// Text the user typed, trimmed.
    pub fn text(&self) -> &str {
        self.body.plain_text().trim()
    }

    /// Extracted text of the quoted message, if this message is a reply.
    pub fn quoted_text(&self) -> Option<String> {
        self.body.quoted().map(MessageBody::describe)
    }

    /// Conversation key used for history: the group id or the sender's bare id.
    pub fn conversation_key(&self) -> String {
        if self.is_group {
            self.chat.clone()
        } else {
            normalize_id(&self.sender_id)
        }
    }
}

/// Strip a device suffix: `user:device@server` becomes `user@server`.
pub fn normalize_id(id: &str) -> String {
    match id.split_once('@') {
        Some((user, server)) => {
            let user = user.split(':').next().unwrap_or(user);
            format!("{user}@{server}")
        }
        None => id.split(':').next().unwrap_or(id).to_string(),
    }
}

/// The user part of an identifier (`5511999@s.whatsapp.net` -> `5511999`).
pub fn user_part(id: &str) -> &str {
    let user = id.split('@').next().unwrap_or(id);
    user.split(':').next().unwrap_or(user)
}

/// Who authored a conversation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A persisted conversation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub key: String,
    pub role: ConversationRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A previously generated joke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JokeRecord {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Kinds of media the transport can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

/// Handle returned by an upload, passed back to `send_media`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
    pub direct_path: String,
    pub file_length: u64,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Chat presence states the bot advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatPresence {
    Composing,
    Paused,
}

/// A member of a group chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub is_bot: bool,
}
