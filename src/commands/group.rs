//! Group-only commands: self-pause and couples roulette.

use super::reply::Reply;
use super::CommandContext;
use crate::governance::PauseRequest;
use ducker_core::message::normalize_id;
use ducker_core::sanitize::{clean_display_name, is_numeric_name};
use tracing::{error, info};

pub(super) const GROUP_ONLY: &str = "❌ This command only works in groups.";

const DEFAULT_PAUSE_MINUTES: u32 = 5;
const MAX_PAUSE_MINUTES: u32 = 60;

/// Requested pause length: default when absent, unparsable, or not
/// positive; clamped to `[1, 60]`.
pub(super) fn pause_minutes(arg: Option<&str>) -> u32 {
    arg.and_then(|a| a.parse::<i64>().ok())
        .filter(|m| *m > 0)
        .map(|m| m.min(i64::from(MAX_PAUSE_MINUTES)) as u32)
        .unwrap_or(DEFAULT_PAUSE_MINUTES)
        .clamp(1, MAX_PAUSE_MINUTES)
}

pub(super) fn handle_self_pause(args: &[String], ctx: &CommandContext<'_>) -> Vec<Reply> {
    if !ctx.msg.is_group {
        return vec![Reply::Text(GROUP_ONLY.to_string())];
    }
    let minutes = pause_minutes(args.first().map(String::as_str));

    match ctx.pauses.request(&ctx.msg.chat, minutes) {
        // The sequence does its own announcing.
        PauseRequest::Started { .. } => Vec::new(),
        PauseRequest::AlreadyPaused { remaining_minutes } => vec![Reply::Text(format!(
            "⚠️ Bot is already paused! Back in {remaining_minutes} minute(s)."
        ))],
        PauseRequest::InProgress => vec![Reply::Text(
            "⚠️ Self-destruct is already counting down.".to_string(),
        )],
    }
}

pub(super) async fn handle_roulette(ctx: &CommandContext<'_>) -> Vec<Reply> {
    if !ctx.msg.is_group {
        return vec![Reply::Text(GROUP_ONLY.to_string())];
    }
    let group = &ctx.msg.chat;
    let members = match ctx.transport.group_participants(group).await {
        Ok(members) => members,
        Err(e) => {
            error!("could not list members of {group}: {e}");
            return vec![Reply::Text("❌ Could not load the group's members.".to_string())];
        }
    };

    let own = normalize_id(&ctx.transport.own_id());
    let mut names = Vec::new();
    for member in members {
        if member.is_bot || normalize_id(&member.id) == own {
            continue;
        }
        let name = clean_display_name(&ctx.transport.resolve_display_name(&member.id).await);
        if !name.is_empty() && !is_numeric_name(&name) {
            names.push(name);
        }
    }

    let Some((first, second)) = pick_pair(&names) else {
        return vec![Reply::Text(
            "❌ The group needs at least 2 named members to form a couple!".to_string(),
        )];
    };
    info!("[{group}] roulette over {} members", names.len());
    vec![Reply::Text(format!(
        "💕 *COUPLES ROULETTE*\n\n💑 *{first}* & *{second}*"
    ))]
}

/// Two distinct entries chosen uniformly at random.
fn pick_pair(names: &[String]) -> Option<(&str, &str)> {
    if names.len() < 2 {
        return None;
    }
    let picked = rand::seq::index::sample(&mut rand::thread_rng(), names.len(), 2);
    Some((&names[picked.index(0)], &names[picked.index(1)]))
}
