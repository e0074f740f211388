/// Key/value store for agent bookkeeping (polling cursor, last scheduled run)
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Key under which the messaging cursor is stored
pub const CURSOR_KEY: &str = "last_update_id";

/// Set by `potluck start` while the daemon is running
pub const START_REQUEST_KEY: &str = "start_requested";

pub struct AgentStateRepository {
    pool: SqlitePool,
}

impl AgentStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM agent_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read agent state")?;

        Ok(row.map(|r| r.get("value")))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO agent_state (key, value, updated_at) VALUES (?, ?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to write agent state")?;

        Ok(())
    }

    /// Read and delete a key in one go
    pub async fn take(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("DELETE FROM agent_state WHERE key = ? RETURNING value")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to take agent state")?;

        Ok(row.map(|r| r.get("value")))
    }

    /// The persisted polling cursor, if any
    pub async fn cursor(&self) -> Result<Option<i64>> {
        match self.get(CURSOR_KEY).await? {
            Some(value) => Ok(Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid stored cursor '{}'", value))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn set_cursor(&self, cursor: i64) -> Result<()> {
        self.set(CURSOR_KEY, &cursor.to_string()).await
    }
}
