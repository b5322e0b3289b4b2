//! Conversation records per user or group key.

use super::{format_ts, parse_ts, Store};
use chrono::{DateTime, Utc};
use ducker_core::{
    error::DuckerError,
    message::{ConversationMessage, ConversationRole},
};
use uuid::Uuid;

impl Store {
    pub(crate) async fn insert_message(
        &self,
        key: &str,
        role: ConversationRole,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DuckerError> {
        sqlx::query(
            "INSERT INTO chat_history (id, conv_key, role, message_text, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(key)
        .bind(role.as_str())
        .bind(text)
        .bind(format_ts(at))
        .execute(&self.pool)
        .await
        .map_err(|e| DuckerError::Memory(format!("insert failed: {e}")))?;
        Ok(())
    }

    /// Newest `limit` records for `key`, returned oldest-first.
    pub(crate) async fn recent_messages(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DuckerError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT role, message_text, timestamp FROM chat_history \
             WHERE conv_key = ? ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(key)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DuckerError::Memory(format!("query failed: {e}")))?;

        let mut messages = rows
            .into_iter()
            .map(|(role, text, ts)| -> Result<ConversationMessage, DuckerError> {
                let role = ConversationRole::parse(&role)
                    .ok_or_else(|| DuckerError::Memory(format!("unknown role {role:?}")))?;
                Ok(ConversationMessage {
                    key: key.to_string(),
                    role,
                    text,
                    timestamp: parse_ts(&ts)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    pub(crate) async fn delete_messages_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DuckerError> {
        let result = sqlx::query("DELETE FROM chat_history WHERE timestamp < ?")
            .bind(format_ts(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| DuckerError::Memory(format!("delete failed: {e}")))?;
        Ok(result.rows_affected())
    }
}
