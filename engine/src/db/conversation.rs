/// Append-only conversation log
use anyhow::{Context, Result};
use sdk::types::{ConversationEntry, Direction};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};

pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &ConversationEntry) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO conversation_log (session_id, member_id, direction, message_text, transport_message_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.session_id)
        .bind(&entry.member_id)
        .bind(entry.direction.as_str())
        .bind(&entry.text)
        .bind(entry.transport_message_id)
        .bind(to_millis(entry.timestamp))
        .execute(&self.pool)
        .await
        .context("Failed to append conversation entry")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn for_session(&self, session_id: &str) -> Result<Vec<ConversationEntry>> {
        let rows = sqlx::query(
            "SELECT id, session_id, member_id, direction, message_text, transport_message_id, created_at FROM conversation_log WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch conversation")?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    /// The latest `limit` entries, oldest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<ConversationEntry>> {
        let rows = sqlx::query(
            "SELECT id, session_id, member_id, direction, message_text, transport_message_id, created_at FROM conversation_log ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent conversation")?;

        let mut entries: Vec<ConversationEntry> = rows.iter().map(entry_from_row).collect();
        entries.reverse();
        Ok(entries)
    }
}

fn entry_from_row(r: &SqliteRow) -> ConversationEntry {
    let direction = match r.get::<String, _>("direction").as_str() {
        "outgoing" => Direction::Outgoing,
        _ => Direction::Incoming,
    };
    ConversationEntry {
        id: Some(r.get("id")),
        session_id: r.get("session_id"),
        member_id: r.get("member_id"),
        direction,
        text: r.get("message_text"),
        transport_message_id: r.get("transport_message_id"),
        timestamp: from_millis(r.get("created_at")),
    }
}
