use super::pipeline::AI_NOT_CONFIGURED;
use super::prompt::format_conversation_history;
use super::*;
use crate::test_support::{
    group_mention, group_reply, group_text, private_text, MemoryHistory, RecordingTransport,
    ScriptedProvider, Sent, BOT, GROUP,
};
use chrono::TimeZone;
use ducker_core::clock::TokioClock;
use ducker_core::message::{ChatPresence, ConversationMessage, ConversationRole, InboundMessage};

const ANA: &str = "ana@s.whatsapp.net";

struct Harness {
    gateway: Arc<Gateway>,
    transport: Arc<RecordingTransport>,
    provider: Option<Arc<ScriptedProvider>>,
    history: Arc<MemoryHistory>,
}

impl Harness {
    fn build(transport: RecordingTransport, provider: Option<ScriptedProvider>) -> Self {
        let transport = Arc::new(transport);
        let provider = provider.map(Arc::new);
        let history = Arc::new(MemoryHistory::new());
        let gateway = Gateway::new(
            transport.clone(),
            provider.clone().map(|p| p as Arc<dyn Provider>),
            history.clone(),
            &Config::default(),
            Prompts::default(),
            Arc::new(TokioClock::new()),
        );
        Self {
            gateway: Arc::new(gateway),
            transport,
            provider,
            history,
        }
    }

    fn new(provider: ScriptedProvider) -> Self {
        Self::build(RecordingTransport::new(), Some(provider))
    }

    async fn send(&self, msg: InboundMessage) {
        self.gateway.handle_message(msg).await;
    }

    fn bot_replies(&self) -> Vec<String> {
        self.transport
            .texts()
            .into_iter()
            .filter(|t| t.starts_with("🤖 "))
            .collect()
    }

    fn prompts(&self) -> Vec<String> {
        self.provider.as_ref().map(|p| p.prompts()).unwrap_or_default()
    }
}

fn mentioned(text: &str) -> InboundMessage {
    group_mention(ANA, text, &[BOT])
}

// ===================================================================
// Filtering
// ===================================================================

#[tokio::test]
async fn test_own_and_empty_messages_ignored() {
    let h = Harness::new(ScriptedProvider::new());
    let mut own = mentioned("talking to myself");
    own.from_me = true;
    h.send(own).await;
    h.send(group_mention("bot:9@s.whatsapp.net", "echo", &[BOT])).await;
    h.send(group_text(ANA, "   ")).await;

    assert!(h.transport.sent().is_empty());
    assert!(h.prompts().is_empty());
}

// ===================================================================
// Group AI turns
// ===================================================================

#[tokio::test(start_paused = true)]
async fn test_group_turn_end_to_end() {
    let h = Harness::new(ScriptedProvider::new().reply("  Tranquilo, visse.  "));
    h.send(mentioned("@ducker tudo bem?")).await;

    assert_eq!(
        h.transport.sent(),
        vec![
            Sent::Presence {
                chat: GROUP.into(),
                state: ChatPresence::Composing,
            },
            Sent::Text {
                chat: GROUP.into(),
                text: "🤖 Tranquilo, visse.".into(),
            },
            Sent::Presence {
                chat: GROUP.into(),
                state: ChatPresence::Paused,
            },
        ]
    );

    let stored = h.history.messages_for(GROUP);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].role, ConversationRole::User);
    assert_eq!(stored[0].text, "ana: @ducker tudo bem?");
    assert_eq!(stored[1].text, "Tranquilo, visse.");

    let prompt = &h.prompts()[0];
    assert!(prompt.starts_with(&Prompts::default().group));
    assert!(prompt.contains("No previous conversation."));
    assert!(prompt.contains("**ana:** @ducker tudo bem?"));
}

#[tokio::test(start_paused = true)]
async fn test_group_turn_uses_custom_prompt_and_history() {
    let h = Harness::new(ScriptedProvider::new());
    h.gateway.rules().set_custom_prompt(GROUP, "You are a grumpy duck.");
    h.gateway.rules().update(GROUP, |r| r.response_cooldown_secs = 1);

    h.send(mentioned("first")).await;
    tokio::time::advance(Duration::from_secs(2)).await;
    h.send(mentioned("second")).await;

    let prompts = h.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with("You are a grumpy duck."));
    assert!(prompts[1].contains("] User: ana: first"));
    assert!(prompts[1].contains("] DuckerIA: ok"));
}

#[tokio::test(start_paused = true)]
async fn test_group_reply_truncated_at_500() {
    let h = Harness::new(ScriptedProvider::new().reply(&"z".repeat(10_000)));
    h.send(mentioned("talk a lot")).await;

    let reply = &h.bot_replies()[0];
    let body = reply.strip_prefix("🤖 ").unwrap();
    assert_eq!(body.chars().count(), 503);
    assert!(body.ends_with("z..."));
}

#[tokio::test(start_paused = true)]
async fn test_backend_failure_keeps_cooldown_open() {
    let h = Harness::new(ScriptedProvider::new().fail("boom").reply("second try"));
    h.send(mentioned("hello?")).await;

    assert_eq!(h.transport.texts(), vec!["❌ Error processing request in group.".to_string()]);
    let stored = h.history.messages_for(GROUP);
    assert_eq!(stored.len(), 1, "only the inbound message is stored");
    assert_eq!(stored[0].role, ConversationRole::User);

    // No cooldown was consumed: an immediate retry is answered.
    h.send(mentioned("hello again?")).await;
    assert_eq!(h.bot_replies(), vec!["🤖 second try".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_mention_rules_in_pipeline() {
    let h = Harness::new(ScriptedProvider::new());
    h.send(group_text(ANA, "is anyone watching the game tonight at the bar")).await;
    assert!(h.transport.sent().is_empty(), "no mention, no reply");

    h.send(group_reply(ANA, "why though, explain yourself please", BOT, "🤖 hi"))
        .await;
    assert_eq!(h.bot_replies().len(), 1, "quoting the bot overrides the requirement");
}

#[tokio::test(start_paused = true)]
async fn test_paused_group_is_silent() {
    let h = Harness::new(ScriptedProvider::new());
    h.gateway
        .rules()
        .pause_for(GROUP, Duration::from_secs(300));

    h.send(mentioned("hello")).await;
    h.send(group_text(ANA, "!help")).await;
    h.send(group_text(ANA, "!roulette")).await;
    assert!(h.transport.sent().is_empty());
    assert!(h.history.messages_for(GROUP).is_empty());

    h.gateway.unpause_group(GROUP);
    h.send(group_text(ANA, "!help")).await;
    assert_eq!(h.transport.texts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_under_concurrent_arrival() {
    let h = Harness::new(ScriptedProvider::new().with_delay(Duration::from_secs(2)));

    // 90 seconds of traffic, three simultaneous mentions every second.
    let mut handles = Vec::new();
    for _ in 0..90 {
        for i in 0..3 {
            let gw = Arc::clone(&h.gateway);
            handles.push(tokio::spawn(async move {
                gw.handle_message(mentioned(&format!("ping {i}"))).await;
            }));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let replies = h.bot_replies().len();
    assert!(replies >= 1);
    assert!(replies <= 3, "30s cooldown over 90s allows at most 3 replies, got {replies}");
}

#[tokio::test]
async fn test_group_without_provider() {
    let h = Harness::build(RecordingTransport::new(), None);
    h.send(mentioned("hello")).await;
    assert_eq!(h.transport.texts(), vec![AI_NOT_CONFIGURED.to_string()]);
    assert!(h.history.messages_for(GROUP).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_commands_route_through_gateway() {
    let transport = RecordingTransport::new().with_participants(
        GROUP,
        &[(ANA, "Ana", false), ("bia@s.whatsapp.net", "Bia", false), (BOT, "", true)],
    );
    let h = Harness::build(transport, Some(ScriptedProvider::new()));
    h.gateway.rules().block_user(GROUP, ANA);
    h.gateway.rules().disable_ai(GROUP);

    h.send(group_text(ANA, "!roulette")).await;
    let texts = h.transport.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("COUPLES ROULETTE"));
}

// ===================================================================
// Private chats
// ===================================================================

#[tokio::test]
async fn test_private_turn() {
    let h = Harness::new(ScriptedProvider::new().reply("Hello there."));
    h.send(private_text("ana:2@s.whatsapp.net", "what do you do?")).await;

    assert_eq!(h.bot_replies(), vec!["🤖 Hello there.".to_string()]);
    let stored = h.history.messages_for(ANA);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].text, "what do you do?");
    assert!(h.prompts()[0].starts_with(&Prompts::default().private));
    assert!(h.prompts()[0].ends_with("Current user message: what do you do?"));
}

#[tokio::test]
async fn test_private_truncation_and_failure() {
    let h = Harness::new(
        ScriptedProvider::new()
            .reply(&"p".repeat(5000))
            .fail("quota"),
    );
    h.send(private_text(ANA, "long please")).await;
    let reply = &h.bot_replies()[0];
    assert!(reply.ends_with("p\n\n... (response truncated)"));
    assert_eq!(
        reply.chars().count(),
        "🤖 ".chars().count() + 4000 + "\n\n... (response truncated)".chars().count()
    );

    h.send(private_text(ANA, "again")).await;
    assert_eq!(
        h.transport.texts().last().map(String::as_str),
        Some("❌ Error processing your request. Try again later.")
    );
    // user, assistant, user: the failed turn stores no reply.
    assert_eq!(h.history.messages_for(ANA).len(), 3);
}

#[tokio::test]
async fn test_private_commands_and_bare_marker() {
    let h = Harness::new(ScriptedProvider::new());
    h.send(private_text(ANA, "!")).await;
    assert!(h.transport.sent().is_empty());

    h.send(private_text(ANA, "!roulette")).await;
    assert_eq!(
        h.transport.texts(),
        vec!["❌ This command only works in groups.".to_string()]
    );
    assert!(h.prompts().is_empty());
}

// ===================================================================
// History formatting and retention
// ===================================================================

#[test]
fn test_format_conversation_history() {
    assert_eq!(format_conversation_history(&[], "DuckerIA"), "No previous conversation.");
    let at = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 14, 5, 0).unwrap();
    let messages = vec![
        ConversationMessage {
            key: GROUP.into(),
            role: ConversationRole::User,
            text: "ana: hi".into(),
            timestamp: at,
        },
        ConversationMessage {
            key: GROUP.into(),
            role: ConversationRole::Assistant,
            text: "hello".into(),
            timestamp: at,
        },
    ];
    assert_eq!(
        format_conversation_history(&messages, "DuckerIA"),
        "Conversation history:\n[14:05] User: ana: hi\n[14:05] DuckerIA: hello\n"
    );
}

#[tokio::test(start_paused = true)]
async fn test_retention_sweep() {
    let history = MemoryHistory::new();
    let clock = TokioClock::new();
    history
        .append_message(GROUP, ConversationRole::User, "old news")
        .await
        .unwrap();

    assert_eq!(Gateway::retention_sweep(&history, &clock, 30).await, 0);
    tokio::time::advance(Duration::from_secs(31 * 24 * 3600)).await;
    assert_eq!(Gateway::retention_sweep(&history, &clock, 30).await, 1);
    assert!(history.messages_for(GROUP).is_empty());
}

#[tokio::test]
async fn test_run_stops_when_transport_closes() {
    let (transport, tx) = RecordingTransport::new().with_inbound();
    let h = Harness::build(transport, Some(ScriptedProvider::new().reply("hey")));
    let run = tokio::spawn(Arc::clone(&h.gateway).run());

    tx.send(private_text(ANA, "hi")).await.unwrap();
    drop(tx);
    run.await.unwrap().unwrap();

    // Let the spawned handler finish.
    for _ in 0..50 {
        if !h.bot_replies().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.bot_replies(), vec!["🤖 hey".to_string()]);
}
