//! Transport trait implementation for the console.

use super::format::{parse_inbound, sanitize_for_whatsapp, OutboundEvent};
use super::ConsoleTransport;
use async_trait::async_trait;
use ducker_core::{
    error::DuckerError,
    message::{normalize_id, ChatPresence, InboundMessage, MediaKind, MediaRef, Participant},
    traits::Transport,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

impl ConsoleTransport {
    /// Print one outbound action as a JSON line on stdout.
    async fn emit(&self, event: OutboundEvent) -> Result<(), DuckerError> {
        let mut line = event.to_line()?;
        line.push('\n');
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| DuckerError::Transport(format!("console write failed: {e}")))?;
        stdout
            .flush()
            .await
            .map_err(|e| DuckerError::Transport(format!("console flush failed: {e}")))?;
        Ok(())
    }

    /// Build the reference returned by an upload.
    pub(super) fn media_ref(&self, bytes: &[u8], kind: MediaKind) -> MediaRef {
        let n = self.uploads.fetch_add(1, Ordering::Relaxed) + 1;
        let mimetype = match kind {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
            MediaKind::Document => "application/octet-stream",
        };
        MediaRef {
            kind,
            url: format!("console://media/{n}"),
            direct_path: format!("/media/{n}"),
            file_length: bytes.len() as u64,
            mimetype: Some(mimetype.to_string()),
        }
    }

    pub(super) fn lookup_participants(&self, group_id: &str) -> Option<Vec<Participant>> {
        let own = normalize_id(&self.config.bot_id);
        self.config.participants.get(group_id).map(|entries| {
            entries
                .iter()
                .map(|p| Participant {
                    id: p.id.clone(),
                    is_bot: p.is_bot || normalize_id(&p.id) == own,
                })
                .collect()
        })
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn own_id(&self) -> String {
        self.config.bot_id.clone()
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundMessage>, DuckerError> {
        let (tx, rx) = mpsc::channel(64);
        let names = Arc::clone(&self.names);

        info!("Console transport reading JSON lines from stdin");

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("console: stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("console: stdin read failed: {e}");
                        break;
                    }
                };
                match parse_inbound(&line) {
                    Ok(Some(msg)) => {
                        Self::remember_name(&names, &msg.sender_id, &msg.sender_name);
                        if tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("console: ignoring malformed line: {e}"),
                }
            }
        });

        if let Ok(mut reader) = self.reader.lock() {
            *reader = Some(handle);
        }
        Ok(rx)
    }

    async fn send_text(&self, chat: &str, text: &str) -> Result<(), DuckerError> {
        self.emit(OutboundEvent::Text {
            chat: chat.to_string(),
            text: sanitize_for_whatsapp(text),
        })
        .await
    }

    async fn send_text_with_mention(
        &self,
        chat: &str,
        text: &str,
        mentioned_id: &str,
    ) -> Result<(), DuckerError> {
        self.emit(OutboundEvent::Mention {
            chat: chat.to_string(),
            text: sanitize_for_whatsapp(text),
            mentioned: mentioned_id.to_string(),
        })
        .await
    }

    async fn upload_media(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<MediaRef, DuckerError> {
        if bytes.is_empty() {
            return Err(DuckerError::Transport("refusing to upload empty media".into()));
        }
        let media = self.media_ref(&bytes, kind);
        debug!("console: uploaded {} bytes as {}", bytes.len(), media.url);
        Ok(media)
    }

    async fn send_media(
        &self,
        chat: &str,
        media: &MediaRef,
        caption: &str,
        gif_loop: bool,
    ) -> Result<(), DuckerError> {
        self.emit(OutboundEvent::Media {
            chat: chat.to_string(),
            media: media.clone(),
            caption: caption.to_string(),
            gif_loop,
        })
        .await
    }

    async fn send_presence(&self, chat: &str, state: ChatPresence) -> Result<(), DuckerError> {
        self.emit(OutboundEvent::Presence {
            chat: chat.to_string(),
            state,
        })
        .await
    }

    async fn group_participants(&self, group_id: &str) -> Result<Vec<Participant>, DuckerError> {
        self.lookup_participants(group_id)
            .ok_or_else(|| DuckerError::Transport(format!("unknown group {group_id}")))
    }

    async fn resolve_display_name(&self, id: &str) -> String {
        self.names
            .lock()
            .ok()
            .and_then(|map| map.get(&normalize_id(id)).cloned())
            .unwrap_or_default()
    }

    async fn stop(&self) -> Result<(), DuckerError> {
        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }
        info!("Console transport stopped");
        Ok(())
    }
}
