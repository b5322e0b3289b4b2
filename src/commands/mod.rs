//! Chat commands: `!verb args`. Instant actions, AI-generated content,
//! and group games.

mod actions;
mod generative;
mod group;
mod help;
mod reply;


pub use actions::Action;
pub use reply::{emit, Reply};

use crate::governance::PauseScheduler;
use ducker_core::config::Prompts;
use ducker_core::message::InboundMessage;
use ducker_core::traits::{HistoryStore, Provider, Transport};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix that marks a message as a command.
pub const MARKER: char = '!';

/// A marker-prefixed message split into verb and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased, marker stripped.
    pub verb: String,
    pub args: Vec<String>,
}

/// Split `text` on whitespace and strip the marker from the first token.
/// Returns `None` without a marker or when nothing follows it.
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let mut tokens = text.split_whitespace();
    let verb = tokens.next()?.strip_prefix(MARKER)?;
    if verb.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        verb: verb.to_lowercase(),
        args: tokens.map(String::from).collect(),
    })
}

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub msg: &'a InboundMessage,
    pub transport: &'a dyn Transport,
    pub provider: Option<&'a dyn Provider>,
    pub history: &'a dyn HistoryStore,
    pub pauses: &'a Arc<PauseScheduler>,
    pub prompts: &'a Prompts,
    pub media_dir: &'a Path,
}

/// Known commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Joke,
    Pickup,
    Story,
    Explain,
    SelfPause,
    Roulette,
    Help,
}

impl Command {
    /// Map a verb to a command. Unknown verbs return `None` and are ignored.
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "slap" | "tapa" => Some(Self::Action(Action::Slap)),
            "kick" | "chute" => Some(Self::Action(Action::Kick)),
            "flyingkick" | "flying" | "voadora" => Some(Self::Action(Action::FlyingKick)),
            "kiss" | "beijo" => Some(Self::Action(Action::Kiss)),
            "hug" | "abraco" | "abraço" => Some(Self::Action(Action::Hug)),
            "joke" | "piada" => Some(Self::Joke),
            "pickup" | "cantada" => Some(Self::Pickup),
            "story" | "historia" | "história" => Some(Self::Story),
            "explain" | "explique" => Some(Self::Explain),
            "selfdestruct" | "pause" | "autodestruicao" | "autodestruição" => {
                Some(Self::SelfPause)
            }
            "roulette" | "roletacasais" | "roleta" | "casais" => Some(Self::Roulette),
            "help" | "ajuda" | "menu" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Run a command and return what should be sent back.
pub async fn dispatch(
    command: Command,
    parsed: &ParsedCommand,
    ctx: &CommandContext<'_>,
) -> Vec<Reply> {
    let verb = parsed.verb.as_str();
    let args = parsed.args.as_slice();
    match command {
        Command::Action(action) => actions::handle_action(action, verb, args, ctx),
        Command::Joke => generative::handle_joke(ctx).await,
        Command::Pickup => generative::handle_pickup(verb, args, ctx).await,
        Command::Story => generative::handle_story(args, ctx).await,
        Command::Explain => generative::handle_explain(verb, ctx).await,
        Command::SelfPause => group::handle_self_pause(args, ctx),
        Command::Roulette => group::handle_roulette(ctx).await,
        Command::Help => vec![Reply::Text(help::HELP.to_string())],
    }
}

/// Dispatch and deliver. Unknown verbs are a silent no-op.
pub async fn handle(parsed: &ParsedCommand, ctx: &CommandContext<'_>) {
    let Some(command) = Command::from_verb(&parsed.verb) else {
        debug!("ignoring unknown command !{}", parsed.verb);
        return;
    };
    info!(
        "[{}] {} runs !{} {:?}",
        ctx.msg.chat, ctx.msg.sender_id, parsed.verb, parsed.args
    );
    let replies = dispatch(command, parsed, ctx).await;
    emit(ctx.transport, &ctx.msg.chat, replies).await;
}
