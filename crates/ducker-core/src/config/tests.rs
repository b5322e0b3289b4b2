use super::prompts::parse_markdown_sections;
use super::*;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.ducker.name, "DuckerIA");
    assert_eq!(cfg.memory.retention_days, 30);
    assert_eq!(cfg.governance.max_history_messages, 50);
    assert_eq!(cfg.governance.response_cooldown_secs, 30);
    assert!(cfg.governance.require_mention);
    assert!(cfg.governance.ai_enabled);
    assert_eq!(
        cfg.governance.bot_aliases,
        vec!["ducker", "duckeria", "botia", "bot"]
    );
    assert_eq!(cfg.media.dir, "static/gif");
}

#[test]
fn test_gemini_section_from_toml() {
    let cfg = parse(
        r#"
        [provider.gemini]
        api_key = "k-123"
        "#,
    )
    .unwrap();
    let gemini = cfg.provider.gemini.unwrap();
    assert!(gemini.enabled);
    assert_eq!(gemini.model, "gemini-2.5-flash");
    assert_eq!(gemini.resolved_api_key().as_deref(), Some("k-123"));
}

#[test]
fn test_governance_overrides() {
    let cfg = parse(
        r#"
        [governance]
        bot_aliases = ["quack"]
        response_cooldown_secs = 5
        require_mention = false
        "#,
    )
    .unwrap();
    assert_eq!(cfg.governance.bot_aliases, vec!["quack"]);
    assert_eq!(cfg.governance.response_cooldown_secs, 5);
    assert!(!cfg.governance.require_mention);
    assert_eq!(cfg.governance.mention_length_bound, 100);
}

#[test]
fn test_zero_cooldown_rejected() {
    let err = parse("[governance]\nresponse_cooldown_secs = 0\n").unwrap_err();
    assert!(err.to_string().contains("response_cooldown_secs"));
}

#[test]
fn test_console_participants() {
    let cfg = parse(
        r#"
        [channel.console]
        bot_id = "bot@s.whatsapp.net"

        [[channel.console.participants."g1@g.us"]]
        id = "a@s.whatsapp.net"
        name = "Ana"
        "#,
    )
    .unwrap();
    let console = cfg.channel.console.unwrap();
    assert!(console.enabled);
    assert_eq!(console.participants["g1@g.us"][0].name, "Ana");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__ducker_config__.toml").unwrap();
    assert_eq!(cfg.provider.default, "gemini");
    assert!(cfg.provider.gemini.is_some());
}

#[test]
fn test_parse_markdown_sections() {
    let sections = parse_markdown_sections("intro\n## Group\nBe brief.\n\n## Joke\n\n## Story\nOnce {genre}\n");
    assert_eq!(sections.get("Group").map(String::as_str), Some("Be brief."));
    assert!(!sections.contains_key("Joke"));
    assert_eq!(sections.get("Story").map(String::as_str), Some("Once {genre}"));
}

#[test]
fn test_prompts_load_overrides() {
    let tmp = std::env::temp_dir().join("__ducker_test_prompts__");
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(tmp.join("prompts")).unwrap();
    std::fs::write(
        tmp.join("prompts/SYSTEM_PROMPT.md"),
        "## Group\nYou are a duck.\n",
    )
    .unwrap();

    let prompts = Prompts::load(tmp.to_str().unwrap());
    assert_eq!(prompts.group, "You are a duck.");
    assert_eq!(prompts.joke, Prompts::default().joke);

    let _ = std::fs::remove_dir_all(&tmp);
}

#[test]
fn test_shellexpand() {
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(
            shellexpand("~/x"),
            format!("{}/x", home.to_string_lossy())
        );
    }
}
