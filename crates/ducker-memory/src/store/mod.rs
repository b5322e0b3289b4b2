//! SQLite-backed history store.
//!
//! Split into focused submodules:
//! - `messages`: conversation records per user or group key
//! - `jokes`: joke log used by the anti-repeat prompt
//!
//! Timestamps are stored as fixed-width RFC 3339 text so that string
//! comparison orders them chronologically.

mod jokes;
mod messages;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use ducker_core::{
    config::MemoryConfig,
    error::DuckerError,
    message::{ConversationMessage, ConversationRole, JokeRecord},
    shellexpand,
    traits::HistoryStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Persistent history store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new store, running migrations on first use.
    pub async fn new(config: &MemoryConfig) -> Result<Self, DuckerError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DuckerError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| DuckerError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| DuckerError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("History store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get the database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, DuckerError> {
        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DuckerError::Memory(format!("pragma failed: {e}")))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DuckerError::Memory(format!("pragma failed: {e}")))?;

        Ok((page_count * page_size) as u64)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DuckerError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| DuckerError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        DuckerError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| DuckerError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    DuckerError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DuckerError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DuckerError::Memory(format!("bad timestamp {raw:?}: {e}")))
}

#[async_trait]
impl HistoryStore for Store {
    async fn append_message(
        &self,
        key: &str,
        role: ConversationRole,
        text: &str,
    ) -> Result<(), DuckerError> {
        self.insert_message(key, role, text, Utc::now()).await
    }

    async fn load_recent(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DuckerError> {
        self.recent_messages(key, limit).await
    }

    async fn append_joke(&self, text: &str) -> Result<(), DuckerError> {
        self.insert_joke(text, Utc::now()).await
    }

    async fn load_recent_jokes(&self, limit: usize) -> Result<Vec<JokeRecord>, DuckerError> {
        self.recent_jokes(limit).await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DuckerError> {
        let messages = self.delete_messages_before(cutoff).await?;
        let jokes = self.delete_jokes_before(cutoff).await?;
        Ok(messages + jokes)
    }
}
