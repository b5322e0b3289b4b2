//! Joke log.

use super::{format_ts, parse_ts, Store};
use chrono::{DateTime, Utc};
use ducker_core::{error::DuckerError, message::JokeRecord};
use uuid::Uuid;

impl Store {
    pub(crate) async fn insert_joke(&self, text: &str, at: DateTime<Utc>) -> Result<(), DuckerError> {
        sqlx::query("INSERT INTO jokes_history (id, joke_text, timestamp) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(text)
            .bind(format_ts(at))
            .execute(&self.pool)
            .await
            .map_err(|e| DuckerError::Memory(format!("insert failed: {e}")))?;
        Ok(())
    }

    /// Newest `limit` jokes, returned oldest-first.
    pub(crate) async fn recent_jokes(&self, limit: usize) -> Result<Vec<JokeRecord>, DuckerError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT joke_text, timestamp FROM jokes_history \
             ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DuckerError::Memory(format!("query failed: {e}")))?;

        let mut jokes = rows
            .into_iter()
            .map(|(text, ts)| -> Result<JokeRecord, DuckerError> {
                Ok(JokeRecord {
                    text,
                    timestamp: parse_ts(&ts)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        jokes.reverse();
        Ok(jokes)
    }

    pub(crate) async fn delete_jokes_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DuckerError> {
        let result = sqlx::query("DELETE FROM jokes_history WHERE timestamp < ?")
            .bind(format_ts(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| DuckerError::Memory(format!("delete failed: {e}")))?;
        Ok(result.rows_affected())
    }
}
