/// Meal history persistence
///
/// One row per cooked recipe. Plan generation reads the last few weeks so
/// the same dishes do not come back too soon.
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use sdk::types::MealHistoryEntry;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_date;

pub struct MealHistoryRepository {
    pool: SqlitePool,
}

impl MealHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &MealHistoryEntry) -> Result<i64> {
        let tags = serde_json::to_string(&entry.tags).context("Failed to encode tags")?;

        let result = sqlx::query(
            r#"
            INSERT INTO meal_history (recipe_name, cuisine, main_protein, tags, cooked_date, rating, session_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.recipe_name)
        .bind(&entry.cuisine)
        .bind(&entry.main_protein)
        .bind(tags)
        .bind(entry.cooked_date.to_string())
        .bind(entry.rating.map(i64::from))
        .bind(&entry.session_id)
        .execute(&self.pool)
        .await
        .context("Failed to append meal history")?;

        Ok(result.last_insert_rowid())
    }

    /// Entries cooked on or after `since`, newest first
    pub async fn since(&self, since: NaiveDate) -> Result<Vec<MealHistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, recipe_name, cuisine, main_protein, tags, cooked_date, rating, session_id FROM meal_history WHERE cooked_date >= ? ORDER BY cooked_date DESC, id DESC",
        )
        .bind(since.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch meal history")?;

        rows.iter().map(history_from_row).collect()
    }

    /// Entries from the `weeks` weeks before `today`
    ///
    /// A window reaching past the earliest representable date covers all
    /// history.
    pub async fn recent_weeks(&self, today: NaiveDate, weeks: u32) -> Result<Vec<MealHistoryEntry>> {
        let since = today
            .checked_sub_signed(Duration::weeks(i64::from(weeks)))
            .unwrap_or(NaiveDate::MIN);
        self.since(since).await
    }

    pub async fn for_session(&self, session_id: &str) -> Result<Vec<MealHistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, recipe_name, cuisine, main_protein, tags, cooked_date, rating, session_id FROM meal_history WHERE session_id = ? ORDER BY cooked_date ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch session history")?;

        rows.iter().map(history_from_row).collect()
    }
}

fn history_from_row(r: &SqliteRow) -> Result<MealHistoryEntry> {
    let tags: String = r.get("tags");
    let cooked: String = r.get("cooked_date");
    Ok(MealHistoryEntry {
        id: Some(r.get("id")),
        recipe_name: r.get("recipe_name"),
        cuisine: r.get("cuisine"),
        main_protein: r.get("main_protein"),
        tags: serde_json::from_str(&tags).context("Invalid stored history tags")?,
        cooked_date: parse_date(&cooked)?,
        rating: r.get::<Option<i64>, _>("rating").map(|v| v.clamp(0, 255) as u8),
        session_id: r.get("session_id"),
    })
}
