//! Commands backed by the AI provider: joke, pickup line, story, explain.

use super::actions::{usage, Target};
use super::reply::Reply;
use super::CommandContext;
use ducker_core::message::{ChatPresence, JokeRecord};
use ducker_core::sanitize::truncate;
use ducker_core::traits::Provider;
use tracing::{error, info, warn};

pub(super) const NOT_CONFIGURED: &str =
    "❌ The AI backend is not configured. Set an API key to use this command.";

/// Prior jokes injected into the joke prompt.
const JOKE_HISTORY_LIMIT: usize = 50;
const JOKE_BOUND: usize = 500;
const PICKUP_BOUND: usize = 500;
const STORY_BOUND: usize = 3000;
const EXPLAIN_BOUND: usize = 1000;
const DEFAULT_GENRE: &str = "adventure";

/// The provider, after a typing hint. Without one, the fixed
/// not-configured reply.
async fn begin<'a>(ctx: &CommandContext<'a>) -> Result<&'a dyn Provider, Vec<Reply>> {
    let provider = ctx
        .provider
        .ok_or_else(|| vec![Reply::Text(NOT_CONFIGURED.to_string())])?;
    if let Err(e) = ctx
        .transport
        .send_presence(&ctx.msg.chat, ChatPresence::Composing)
        .await
    {
        warn!("typing indicator failed in {}: {e}", ctx.msg.chat);
    }
    Ok(provider)
}

/// Run the prompt; on failure, the fixed error reply for `what`.
async fn generate(provider: &dyn Provider, prompt: &str, what: &str) -> Result<String, Vec<Reply>> {
    provider.generate(prompt).await.map_err(|e| {
        error!("{what} generation failed: {e}");
        vec![
            Reply::Presence(ChatPresence::Paused),
            Reply::Text(format!("❌ Error generating {what}. Try again later.")),
        ]
    })
}

/// The do-not-repeat block appended to the joke prompt.
pub(super) fn format_joke_history(jokes: &[JokeRecord]) -> String {
    if jokes.is_empty() {
        return String::new();
    }
    let mut out = String::from(
        "\n\nIMPORTANT: These jokes were already told. Do NOT repeat any of them:\n\n",
    );
    for (i, joke) in jokes.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, joke.text));
    }
    out.push_str("\nWrite a NEW joke, different from the ones above.");
    out
}

pub(super) async fn handle_joke(ctx: &CommandContext<'_>) -> Vec<Reply> {
    let provider = match begin(ctx).await {
        Ok(p) => p,
        Err(replies) => return replies,
    };

    let told = ctx
        .history
        .load_recent_jokes(JOKE_HISTORY_LIMIT)
        .await
        .unwrap_or_else(|e| {
            warn!("joke history unavailable, continuing without it: {e}");
            Vec::new()
        });
    let prompt = format!(
        "{}{}\n\nTell the joke now:",
        ctx.prompts.joke,
        format_joke_history(&told)
    );

    let joke = match generate(provider, &prompt, "joke").await {
        Ok(text) => truncate(text.trim(), JOKE_BOUND, "..."),
        Err(replies) => return replies,
    };
    if let Err(e) = ctx.history.append_joke(&joke).await {
        warn!("failed to save joke: {e}");
    }
    info!("[{}] joke sent ({} prior)", ctx.msg.chat, told.len());

    vec![
        Reply::Presence(ChatPresence::Paused),
        Reply::Text(format!("😄 *Joke:*\n\n{joke}")),
    ]
}

pub(super) async fn handle_pickup(
    verb: &str,
    args: &[String],
    ctx: &CommandContext<'_>,
) -> Vec<Reply> {
    let Some(arg) = args.first() else {
        return vec![usage(verb)];
    };
    let provider = match begin(ctx).await {
        Ok(p) => p,
        Err(replies) => return replies,
    };
    let target = Target::resolve(arg, ctx.msg);
    let prompt = ctx.prompts.pickup.replace("{target}", &target.name);

    let line = match generate(provider, &prompt, "pickup line").await {
        Ok(text) => truncate(text.trim(), PICKUP_BOUND, "..."),
        Err(replies) => return replies,
    };
    let text = format!("💕 *Pickup line for @{}:*\n\n{line}", target.name);

    let reply = match target.id {
        Some(mentioned) => Reply::Mention { text, mentioned },
        None => Reply::Text(text),
    };
    vec![Reply::Presence(ChatPresence::Paused), reply]
}

pub(super) async fn handle_story(args: &[String], ctx: &CommandContext<'_>) -> Vec<Reply> {
    let provider = match begin(ctx).await {
        Ok(p) => p,
        Err(replies) => return replies,
    };
    let genre = if args.is_empty() {
        DEFAULT_GENRE.to_string()
    } else {
        args.join(" ").to_lowercase()
    };
    let prompt = ctx.prompts.story.replace("{genre}", &genre);

    let story = match generate(provider, &prompt, "story").await {
        Ok(text) => truncate(text.trim(), STORY_BOUND, "\n\n... (story truncated)"),
        Err(replies) => return replies,
    };
    info!("[{}] {genre} story sent", ctx.msg.chat);

    vec![
        Reply::Presence(ChatPresence::Paused),
        Reply::Text(format!("📖 *{} story:*\n\n{story}", capitalize(&genre))),
    ]
}

pub(super) async fn handle_explain(verb: &str, ctx: &CommandContext<'_>) -> Vec<Reply> {
    let provider = match begin(ctx).await {
        Ok(p) => p,
        Err(replies) => return replies,
    };
    let Some(quoted) = ctx.msg.quoted_text().filter(|t| !t.trim().is_empty()) else {
        return vec![
            Reply::Presence(ChatPresence::Paused),
            Reply::Text(format!(
                "❌ Reply to a message before using !{verb}.\n\nHow to use:\n1. Reply to the message you want explained\n2. Type: !{verb}"
            )),
        ];
    };
    let prompt = ctx.prompts.explain.replace("{text}", &quoted);

    let explanation = match generate(provider, &prompt, "explanation").await {
        Ok(text) => truncate(text.trim(), EXPLAIN_BOUND, "..."),
        Err(replies) => return replies,
    };

    vec![
        Reply::Presence(ChatPresence::Paused),
        Reply::Text(format!("💡 *Explanation:*\n\n{explanation}")),
    ]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
