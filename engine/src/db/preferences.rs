/// Preference persistence
///
/// Preferences are only ever inserted or have their confidence raised.
use anyhow::{Context, Result};
use chrono::Utc;
use sdk::types::Preference;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};

pub struct PreferenceRepository {
    pool: SqlitePool,
}

impl PreferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a preference and return its row id
    pub async fn insert(&self, preference: &Preference) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO preferences (member_id, category, detail, confidence, source, extracted_from, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&preference.member_id)
        .bind(&preference.category)
        .bind(&preference.detail)
        .bind(preference.confidence)
        .bind(&preference.source)
        .bind(&preference.extracted_from)
        .bind(to_millis(preference.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to insert preference")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_confidence(&self, id: i64, confidence: f64) -> Result<()> {
        sqlx::query("UPDATE preferences SET confidence = ?, updated_at = ? WHERE id = ?")
            .bind(confidence)
            .bind(Utc::now().timestamp_millis())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update preference confidence")?;
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Preference>> {
        let row = sqlx::query(
            "SELECT id, member_id, category, detail, confidence, source, extracted_from, created_at, updated_at FROM preferences WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch preference")?;

        Ok(row.as_ref().map(preference_from_row))
    }

    /// A member's preferences in insertion order
    pub async fn for_member(&self, member_id: &str) -> Result<Vec<Preference>> {
        let rows = sqlx::query(
            "SELECT id, member_id, category, detail, confidence, source, extracted_from, created_at, updated_at FROM preferences WHERE member_id = ? ORDER BY id ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch member preferences")?;

        Ok(rows.iter().map(preference_from_row).collect())
    }

    pub async fn all(&self) -> Result<Vec<Preference>> {
        let rows = sqlx::query(
            "SELECT id, member_id, category, detail, confidence, source, extracted_from, created_at, updated_at FROM preferences ORDER BY member_id ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch preferences")?;

        Ok(rows.iter().map(preference_from_row).collect())
    }
}

fn preference_from_row(r: &SqliteRow) -> Preference {
    Preference {
        id: Some(r.get("id")),
        member_id: r.get("member_id"),
        category: r.get("category"),
        detail: r.get("detail"),
        confidence: r.get("confidence"),
        source: r.get("source"),
        extracted_from: r.get("extracted_from"),
        created_at: from_millis(r.get("created_at")),
        updated_at: r.get::<Option<i64>, _>("updated_at").map(from_millis),
    }
}
