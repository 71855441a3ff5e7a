//! Guild Configuration Store
//!
//! Per-guild bot settings. Rows are created on first setup and never
//! hard-deleted; a reset only clears the admin role so audit history
//! stays attributable.

use sqlx::PgPool;

use crate::db::{db_error, GuildConfig};
use crate::error::CoreResult;

/// Handle for guild-level configuration.
#[derive(Debug, Clone)]
pub struct GuildStore {
    pool: PgPool,
}

impl GuildStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the guild row on first setup, or update its admin role.
    pub async fn ensure_guild(
        &self,
        guild_id: i64,
        admin_role_id: Option<i64>,
    ) -> CoreResult<GuildConfig> {
        let config = sqlx::query_as::<_, GuildConfig>(
            r"
            INSERT INTO guild_configs (guild_id, admin_role_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE
                SET admin_role_id = EXCLUDED.admin_role_id,
                    updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(guild_id)
        .bind(admin_role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error!("ensure_guild", guild_id = guild_id))?;

        Ok(config)
    }

    /// Fetch a guild's configuration.
    pub async fn get_guild(&self, guild_id: i64) -> CoreResult<Option<GuildConfig>> {
        let config =
            sqlx::query_as::<_, GuildConfig>("SELECT * FROM guild_configs WHERE guild_id = $1")
                .bind(guild_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error!("get_guild", guild_id = guild_id))?;

        Ok(config)
    }

    /// Change the admin role. `None` falls back to members holding the
    /// platform Administrator permission.
    pub async fn set_admin_role(
        &self,
        guild_id: i64,
        admin_role_id: Option<i64>,
    ) -> CoreResult<Option<GuildConfig>> {
        let config = sqlx::query_as::<_, GuildConfig>(
            "UPDATE guild_configs SET admin_role_id = $2, updated_at = NOW()
             WHERE guild_id = $1 RETURNING *",
        )
        .bind(guild_id)
        .bind(admin_role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("set_admin_role", guild_id = guild_id))?;

        Ok(config)
    }

    /// Soft reset: clears the admin role, keeps the row.
    ///
    /// Returns whether a configured guild was reset.
    pub async fn reset_guild(&self, guild_id: i64) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE guild_configs SET admin_role_id = NULL, updated_at = NOW()
             WHERE guild_id = $1",
        )
        .bind(guild_id)
        .execute(&self.pool)
        .await
        .map_err(db_error!("reset_guild", guild_id = guild_id))?;

        Ok(result.rows_affected() > 0)
    }
}
