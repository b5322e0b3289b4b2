//! Delivery of command output with graceful degradation.

use ducker_core::error::DuckerError;
use ducker_core::message::{ChatPresence, MediaKind};
use ducker_core::traits::Transport;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Appended to a caption when its media could not be delivered.
pub(crate) const MEDIA_UNAVAILABLE: &str = "\n\n[media unavailable]";

/// One outbound action produced by a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// Text that tags `mentioned` so they get notified.
    Mention { text: String, mentioned: String },
    /// A local `.mp4` sent as a looping GIF. With `mentioned`, the caption
    /// follows as a separate mention message.
    Media {
        path: PathBuf,
        caption: String,
        mentioned: Option<String>,
    },
    Presence(ChatPresence),
}

/// Send `replies` in order. Failures degrade and never abort the rest.
pub async fn emit(transport: &dyn Transport, chat: &str, replies: Vec<Reply>) {
    for reply in replies {
        match reply {
            Reply::Text(text) => send_text(transport, chat, &text).await,
            Reply::Mention { text, mentioned } => {
                send_mention(transport, chat, &text, &mentioned).await
            }
            Reply::Media {
                path,
                caption,
                mentioned,
            } => send_media(transport, chat, &path, &caption, mentioned.as_deref()).await,
            Reply::Presence(state) => {
                if let Err(e) = transport.send_presence(chat, state).await {
                    debug!("presence update failed in {chat}: {e}");
                }
            }
        }
    }
}

async fn send_text(transport: &dyn Transport, chat: &str, text: &str) {
    if let Err(e) = transport.send_text(chat, text).await {
        error!("failed to send reply to {chat}: {e}");
    }
}

/// Mention, falling back to a plain send.
async fn send_mention(transport: &dyn Transport, chat: &str, text: &str, mentioned: &str) {
    if let Err(e) = transport.send_text_with_mention(chat, text, mentioned).await {
        warn!("mention send failed in {chat}, sending plain text: {e}");
        send_text(transport, chat, text).await;
    }
}

async fn send_media(
    transport: &dyn Transport,
    chat: &str,
    path: &Path,
    caption: &str,
    mentioned: Option<&str>,
) {
    let attached = if mentioned.is_some() { "" } else { caption };
    match deliver_gif(transport, chat, path, attached).await {
        Ok(()) => {
            info!("sent {} to {chat}", path.display());
            if let Some(id) = mentioned {
                send_mention(transport, chat, caption, id).await;
            }
        }
        Err(e) => {
            warn!("media delivery failed for {}: {e}", path.display());
            let fallback = format!("{caption}{MEDIA_UNAVAILABLE}");
            match mentioned {
                Some(id) => send_mention(transport, chat, &fallback, id).await,
                None => send_text(transport, chat, &fallback).await,
            }
        }
    }
}

async fn deliver_gif(
    transport: &dyn Transport,
    chat: &str,
    path: &Path,
    caption: &str,
) -> Result<(), DuckerError> {
    let bytes = tokio::fs::read(path).await?;
    let media = transport.upload_media(bytes, MediaKind::Video).await?;
    transport.send_media(chat, &media, caption, true).await
}
