/// Recipe and ingredient persistence
///
/// Recipes are written and replaced as a whole set per session inside one
/// transaction. Only ingredient resolution fields are ever updated in place.
use anyhow::{Context, Result};
use chrono::Utc;
use sdk::types::{Ingredient, Recipe, SearchStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::parse_date;

pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete every recipe of the session, then insert the new set
    ///
    /// Either the whole new set is stored or the old set is left untouched.
    pub async fn replace_for_session(&self, session_id: &str, recipes: &[Recipe]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        delete_session_rows(&mut tx, session_id).await?;
        for recipe in recipes {
            insert_recipe(&mut tx, session_id, recipe).await?;
        }
        tx.commit().await.context("Failed to commit recipe replacement")?;
        Ok(())
    }

    pub async fn delete_for_session(&self, session_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        delete_session_rows(&mut tx, session_id).await?;
        tx.commit().await.context("Failed to commit recipe deletion")?;
        Ok(())
    }

    /// Recipes of a session ordered by planned date, with ingredients
    pub async fn for_session(&self, session_id: &str) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, planned_date, name, description, servings,
                   prep_time_minutes, cook_time_minutes, cuisine, tags, instructions, approved
            FROM recipes WHERE session_id = ?
            ORDER BY planned_date ASC, created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recipes")?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut recipe = recipe_from_row(row)?;
            recipe.ingredients = self.ingredients_for(&recipe.id).await?;
            recipes.push(recipe);
        }
        Ok(recipes)
    }

    async fn ingredients_for(&self, recipe_id: &str) -> Result<Vec<Ingredient>> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipe_id, name, quantity, unit, category, optional, already_available,
                   product_id, product_name, added_to_cart, search_status
            FROM recipe_ingredients WHERE recipe_id = ?
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch ingredients")?;

        rows.iter().map(ingredient_from_row).collect()
    }

    pub async fn mark_approved(&self, session_id: &str) -> Result<()> {
        sqlx::query("UPDATE recipes SET approved = 1 WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .context("Failed to approve recipes")?;
        Ok(())
    }

    /// Persist availability and catalog resolution fields of a stored ingredient
    pub async fn update_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        let id = ingredient
            .id
            .context("Cannot update an ingredient that was never stored")?;

        sqlx::query(
            r#"
            UPDATE recipe_ingredients
            SET already_available = ?, product_id = ?, product_name = ?,
                added_to_cart = ?, search_status = ?
            WHERE id = ?
            "#,
        )
        .bind(ingredient.already_available)
        .bind(&ingredient.product_id)
        .bind(&ingredient.product_name)
        .bind(ingredient.added_to_cart)
        .bind(ingredient.search_status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update ingredient")?;

        Ok(())
    }
}

async fn delete_session_rows(tx: &mut Transaction<'_, Sqlite>, session_id: &str) -> Result<()> {
    sqlx::query(
        "DELETE FROM recipe_ingredients WHERE recipe_id IN (SELECT id FROM recipes WHERE session_id = ?)",
    )
    .bind(session_id)
    .execute(&mut **tx)
    .await
    .context("Failed to delete ingredients")?;

    sqlx::query("DELETE FROM recipes WHERE session_id = ?")
        .bind(session_id)
        .execute(&mut **tx)
        .await
        .context("Failed to delete recipes")?;

    Ok(())
}

async fn insert_recipe(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: &str,
    recipe: &Recipe,
) -> Result<()> {
    let tags = serde_json::to_string(&recipe.tags).context("Failed to encode recipe tags")?;

    sqlx::query(
        r#"
        INSERT INTO recipes (id, session_id, planned_date, name, description, servings,
            prep_time_minutes, cook_time_minutes, cuisine, tags, instructions, approved, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&recipe.id)
    .bind(session_id)
    .bind(recipe.planned_date.to_string())
    .bind(&recipe.name)
    .bind(&recipe.description)
    .bind(recipe.servings as i64)
    .bind(recipe.prep_time_minutes as i64)
    .bind(recipe.cook_time_minutes as i64)
    .bind(&recipe.cuisine)
    .bind(tags)
    .bind(&recipe.instructions)
    .bind(recipe.approved)
    .bind(Utc::now().timestamp_millis())
    .execute(&mut **tx)
    .await
    .with_context(|| format!("Failed to insert recipe '{}'", recipe.name))?;

    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, position, name, quantity, unit, category,
                optional, already_available, product_id, product_name, added_to_cart, search_status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe.id)
        .bind(position as i64)
        .bind(&ingredient.name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(&ingredient.category)
        .bind(ingredient.optional)
        .bind(ingredient.already_available)
        .bind(&ingredient.product_id)
        .bind(&ingredient.product_name)
        .bind(ingredient.added_to_cart)
        .bind(ingredient.search_status.as_str())
        .execute(&mut **tx)
        .await
        .context("Failed to insert ingredient")?;
    }

    Ok(())
}

fn recipe_from_row(r: &SqliteRow) -> Result<Recipe> {
    let planned: String = r.get("planned_date");
    let tags: String = r.get("tags");
    Ok(Recipe {
        id: r.get("id"),
        session_id: r.get("session_id"),
        planned_date: parse_date(&planned)?,
        name: r.get("name"),
        description: r.get("description"),
        servings: r.get::<i64, _>("servings") as u32,
        prep_time_minutes: r.get::<i64, _>("prep_time_minutes") as u32,
        cook_time_minutes: r.get::<i64, _>("cook_time_minutes") as u32,
        cuisine: r.get("cuisine"),
        tags: serde_json::from_str(&tags).context("Invalid stored recipe tags")?,
        instructions: r.get("instructions"),
        approved: r.get("approved"),
        ingredients: Vec::new(),
    })
}

fn ingredient_from_row(r: &SqliteRow) -> Result<Ingredient> {
    let status: String = r.get("search_status");
    Ok(Ingredient {
        id: Some(r.get("id")),
        recipe_id: Some(r.get("recipe_id")),
        name: r.get("name"),
        quantity: r.get("quantity"),
        unit: r.get("unit"),
        category: r.get("category"),
        optional: r.get("optional"),
        already_available: r.get("already_available"),
        product_id: r.get("product_id"),
        product_name: r.get("product_name"),
        added_to_cart: r.get("added_to_cart"),
        search_status: status
            .parse::<SearchStatus>()
            .map_err(|e| anyhow::anyhow!(e))?,
    })
}
