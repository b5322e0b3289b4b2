//! Playful action commands: a GIF aimed at another member.

use super::reply::{Reply, MEDIA_UNAVAILABLE};
use super::CommandContext;
use ducker_core::error::DuckerError;
use ducker_core::message::{user_part, InboundMessage};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Slap,
    Kick,
    FlyingKick,
    Kiss,
    Hug,
}

impl Action {
    /// Media subfolder under the configured media directory.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Slap => "slap",
            Self::Kick => "kick",
            Self::FlyingKick => "flying",
            Self::Kiss => "kiss",
            Self::Hug => "hug",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            Self::Slap => "🤚",
            Self::Kick => "🦵",
            Self::FlyingKick => "💥",
            Self::Kiss => "💋",
            Self::Hug => "🤗",
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Self::Slap => "slapped",
            Self::Kick => "kicked",
            Self::FlyingKick => "flying-kicked",
            Self::Kiss => "kissed",
            Self::Hug => "hugged",
        }
    }
}

/// Who a command is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Target {
    /// Resolved identifier. Only `@` arguments resolve, always to the
    /// first mentioned identifier on the message.
    pub id: Option<String>,
    pub name: String,
}

impl Target {
    pub(super) fn resolve(arg: &str, msg: &InboundMessage) -> Self {
        match arg.strip_prefix('@') {
            Some(name) => Self {
                id: msg.body.mentioned_ids().first().cloned(),
                name: name.to_string(),
            },
            None => Self {
                id: None,
                name: arg.to_string(),
            },
        }
    }

    /// `*@name*` when the target can be tagged, `*name*` otherwise.
    pub(super) fn label(&self) -> String {
        match self.id {
            Some(_) => format!("*@{}*", self.name),
            None => format!("*{}*", self.name),
        }
    }
}

pub(super) fn usage(verb: &str) -> Reply {
    Reply::Text(format!("❌ Use: !{verb} @user\nExample: !{verb} @johndoe"))
}

/// Name to announce for the sender.
pub(super) fn sender_name(msg: &InboundMessage) -> String {
    if msg.sender_name.trim().is_empty() {
        user_part(&msg.sender_id).to_string()
    } else {
        msg.sender_name.trim().to_string()
    }
}

pub(super) fn handle_action(
    action: Action,
    verb: &str,
    args: &[String],
    ctx: &CommandContext<'_>,
) -> Vec<Reply> {
    let Some(arg) = args.first() else {
        return vec![usage(verb)];
    };
    let target = Target::resolve(arg, ctx.msg);
    let caption = format!(
        "{} *{}* {} {}!",
        action.emoji(),
        sender_name(ctx.msg),
        action.phrase(),
        target.label()
    );

    match pick_media(ctx.media_dir, action.folder()) {
        Ok(path) => vec![Reply::Media {
            path,
            caption,
            mentioned: target.id,
        }],
        Err(e) => {
            warn!("no media for !{verb}: {e}");
            let text = format!("{caption}{MEDIA_UNAVAILABLE}");
            match target.id {
                Some(mentioned) => vec![Reply::Mention { text, mentioned }],
                None => vec![Reply::Text(text)],
            }
        }
    }
}

/// A random `.mp4` from `{dir}/{folder}`.
pub(super) fn pick_media(dir: &Path, folder: &str) -> Result<PathBuf, DuckerError> {
    let folder_path = dir.join(folder);
    let entries = std::fs::read_dir(&folder_path)
        .map_err(|e| DuckerError::Media(format!("{}: {e}", folder_path.display())))?;

    let clips: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
        })
        .collect();

    clips
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| DuckerError::Media(format!("no .mp4 files in {}", folder_path.display())))
}
