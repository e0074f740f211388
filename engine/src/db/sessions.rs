/// Session persistence
///
/// Sessions are saved with an upsert every time their state changes. The
/// per-run fields (wishes, responders, approval feedback) are stored as JSON
/// so a restart during preference collection keeps what was gathered.
use anyhow::{Context, Result};
use sdk::types::{Session, SessionState};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{from_millis, parse_date, to_millis};

const SESSION_COLUMNS: &str = "id, state, triggered_by, plan_start_date, plan_end_date, state_entered_at, collected_wishes, members_responded, approval_feedback, created_at, updated_at";

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the session or overwrite every column of the stored row
    pub async fn save(&self, session: &Session) -> Result<()> {
        let wishes = serde_json::to_string(&session.collected_wishes)
            .context("Failed to encode collected wishes")?;
        let responded = serde_json::to_string(&session.members_responded)
            .context("Failed to encode responders")?;
        let feedback = serde_json::to_string(&session.approval_feedback)
            .context("Failed to encode approval feedback")?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, state, triggered_by, plan_start_date, plan_end_date,
                state_entered_at, collected_wishes, members_responded, approval_feedback,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                triggered_by = excluded.triggered_by,
                plan_start_date = excluded.plan_start_date,
                plan_end_date = excluded.plan_end_date,
                state_entered_at = excluded.state_entered_at,
                collected_wishes = excluded.collected_wishes,
                members_responded = excluded.members_responded,
                approval_feedback = excluded.approval_feedback,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&session.id)
        .bind(session.state.as_str())
        .bind(&session.triggered_by)
        .bind(session.plan_start_date.map(|d| d.to_string()))
        .bind(session.plan_end_date.map(|d| d.to_string()))
        .bind(to_millis(session.state_entered_at))
        .bind(wishes)
        .bind(responded)
        .bind(feedback)
        .bind(to_millis(session.created_at))
        .bind(to_millis(session.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to save session")?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(&format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch session")?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// The most recent session that is neither idle nor completed
    pub async fn get_active(&self) -> Result<Option<Session>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE state NOT IN ('idle', 'completed') ORDER BY created_at DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active session")?;

        row.as_ref().map(session_from_row).transpose()
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Session>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM sessions ORDER BY created_at DESC LIMIT ?",
            SESSION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sessions")?;

        rows.iter().map(session_from_row).collect()
    }
}

fn session_from_row(r: &SqliteRow) -> Result<Session> {
    let state: String = r.get("state");
    let start: Option<String> = r.get("plan_start_date");
    let end: Option<String> = r.get("plan_end_date");
    let wishes: String = r.get("collected_wishes");
    let responded: String = r.get("members_responded");
    let feedback: String = r.get("approval_feedback");

    Ok(Session {
        id: r.get("id"),
        state: state
            .parse::<SessionState>()
            .map_err(|e| anyhow::anyhow!(e))?,
        triggered_by: r.get("triggered_by"),
        plan_start_date: start.as_deref().map(parse_date).transpose()?,
        plan_end_date: end.as_deref().map(parse_date).transpose()?,
        state_entered_at: from_millis(r.get("state_entered_at")),
        created_at: from_millis(r.get("created_at")),
        updated_at: from_millis(r.get("updated_at")),
        collected_wishes: serde_json::from_str(&wishes)
            .context("Invalid stored collected wishes")?,
        members_responded: serde_json::from_str(&responded)
            .context("Invalid stored responders")?,
        approval_feedback: serde_json::from_str(&feedback)
            .context("Invalid stored approval feedback")?,
    })
}
