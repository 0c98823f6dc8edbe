use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use resq_core::ExchangeRecord;
use sqlx::{Row, SqlitePool};
use tokio::task::JoinHandle;

/// Best-effort sink for completed exchanges. `persist_exchange` hands back
/// the spawned task so callers can observe the outcome without blocking the
/// request path on it.
pub trait ExchangeArchive: Send + Sync {
    fn persist_exchange(&self, record: ExchangeRecord) -> JoinHandle<Result<()>>;
    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>>;
}

#[derive(Clone, Default)]
pub struct MemoryArchive {
    records: Arc<RwLock<Vec<ExchangeRecord>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExchangeArchive for MemoryArchive {
    // Records before spawning; the task only reports the outcome.
    fn persist_exchange(&self, record: ExchangeRecord) -> JoinHandle<Result<()>> {
        self.records.write().push(record);
        tokio::spawn(async { Ok(()) })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>> {
        let records = self.records.read();
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Clone)]
pub struct SqliteArchive {
    pool: SqlitePool,
}

impl SqliteArchive {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let archive = Self { pool };
        archive.ensure_schema().await?;
        Ok(archive)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exchanges (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              owner_id TEXT,
              user_text TEXT NOT NULL,
              response_text TEXT NOT NULL,
              at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ExchangeArchive for SqliteArchive {
    fn persist_exchange(&self, record: ExchangeRecord) -> JoinHandle<Result<()>> {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            sqlx::query(
                r#"
                INSERT INTO exchanges (owner_id, user_text, response_text, at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&record.owner_id)
            .bind(&record.user_text)
            .bind(&record.response_text)
            .bind(record.at.to_rfc3339())
            .execute(&pool)
            .await
            .context("failed persisting exchange record")?;

            Ok(())
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT owner_id, user_text, response_text, at
            FROM exchanges
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| ExchangeRecord {
                owner_id: row.get("owner_id"),
                user_text: row.get("user_text"),
                response_text: row.get("response_text"),
                at: row
                    .get::<String, _>("at")
                    .parse()
                    .unwrap_or_else(|_| Utc::now()),
            })
            .collect();

        Ok(records)
    }
}

#[derive(Clone)]
pub enum Archive {
    Memory(MemoryArchive),
    Sqlite(SqliteArchive),
}

impl Archive {
    pub fn memory() -> Self {
        Self::Memory(MemoryArchive::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteArchive::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl ExchangeArchive for Archive {
    fn persist_exchange(&self, record: ExchangeRecord) -> JoinHandle<Result<()>> {
        match self {
            Archive::Memory(archive) => archive.persist_exchange(record),
            Archive::Sqlite(archive) => archive.persist_exchange(record),
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>> {
        match self {
            Archive::Memory(archive) => archive.recent(limit).await,
            Archive::Sqlite(archive) => archive.recent(limit).await,
        }
    }
}
