//! Serde default functions for configuration fields.

pub(super) fn default_name() -> String {
    "DuckerIA".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.ducker".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_provider() -> String {
    "gemini".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}
pub(super) fn default_db_path() -> String {
    "~/.ducker/data/history.db".to_string()
}
pub(super) fn default_max_context() -> usize {
    20
}
pub(super) fn default_retention_days() -> i64 {
    30
}
pub(super) fn default_sweep_interval() -> u64 {
    24
}
pub(super) fn default_bot_aliases() -> Vec<String> {
    ["ducker", "duckeria", "botia", "bot"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
pub(super) fn default_mention_length_bound() -> usize {
    100
}
pub(super) fn default_max_history() -> usize {
    50
}
pub(super) fn default_cooldown_secs() -> u64 {
    30
}
pub(super) fn default_media_dir() -> String {
    "static/gif".to_string()
}
pub(super) fn default_bot_id() -> String {
    "ducker@s.whatsapp.net".to_string()
}
