/// Family member persistence
///
/// Members come from the config file. Each start re-syncs them by channel
/// address so ids stay stable across restarts while names, roles and the
/// configured order follow the file. Members are never deleted.
use anyhow::{Context, Result};
use chrono::Utc;
use sdk::types::{FamilyMember, MemberRole};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::config::MemberConfig;

pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a member keyed by channel address
    pub async fn upsert(
        &self,
        name: &str,
        address: &str,
        role: MemberRole,
        position: i64,
    ) -> Result<FamilyMember> {
        if let Some(existing) = self.get_by_address(address).await? {
            sqlx::query("UPDATE family_members SET name = ?, role = ?, position = ? WHERE id = ?")
                .bind(name)
                .bind(role.as_str())
                .bind(position)
                .bind(&existing.id)
                .execute(&self.pool)
                .await
                .context("Failed to update family member")?;

            return Ok(FamilyMember {
                id: existing.id,
                name: name.to_string(),
                address: address.to_string(),
                role,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO family_members (id, name, address, role, position, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(address)
        .bind(role.as_str())
        .bind(position)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to insert family member")?;

        Ok(FamilyMember {
            id,
            name: name.to_string(),
            address: address.to_string(),
            role,
        })
    }

    /// Sync configured members, keeping configuration order
    pub async fn sync_from_config(&self, members: &[MemberConfig]) -> Result<Vec<FamilyMember>> {
        let mut synced = Vec::with_capacity(members.len());
        for (position, member) in members.iter().enumerate() {
            synced.push(
                self.upsert(&member.name, &member.address, member.role, position as i64)
                    .await?,
            );
        }
        info!("Synced {} family member(s)", synced.len());
        Ok(synced)
    }

    pub async fn get(&self, id: &str) -> Result<Option<FamilyMember>> {
        let row = sqlx::query("SELECT id, name, address, role FROM family_members WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch family member")?;

        row.as_ref().map(member_from_row).transpose()
    }

    pub async fn get_by_address(&self, address: &str) -> Result<Option<FamilyMember>> {
        let row =
            sqlx::query("SELECT id, name, address, role FROM family_members WHERE address = ?")
                .bind(address)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch family member by address")?;

        row.as_ref().map(member_from_row).transpose()
    }

    /// All members in configured order
    pub async fn list(&self) -> Result<Vec<FamilyMember>> {
        let rows = sqlx::query(
            "SELECT id, name, address, role FROM family_members ORDER BY position ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list family members")?;

        rows.iter().map(member_from_row).collect()
    }

    /// Parents in configured order; the first one is the primary parent
    pub async fn parents(&self) -> Result<Vec<FamilyMember>> {
        let rows = sqlx::query(
            "SELECT id, name, address, role FROM family_members WHERE role = 'parent' ORDER BY position ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list parents")?;

        rows.iter().map(member_from_row).collect()
    }
}

fn member_from_row(r: &SqliteRow) -> Result<FamilyMember> {
    let role: String = r.get("role");
    Ok(FamilyMember {
        id: r.get("id"),
        name: r.get("name"),
        address: r.get("address"),
        role: role
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid stored member role")?,
    })
}
