//! Typed permission updates.
//!
//! Each flag has its own operation so validation and audit detail stay
//! per-field; there is no update-by-field-name path.

use sqlx::PgPool;
use tracing::warn;

use crate::audit::{AuditLog, AuditResult, AuditStatus, NewAuditEntry};
use crate::db::{db_error, UserConfig};
use crate::error::{CoreError, CoreResult};

/// Handle for reading and updating per-user capability flags.
#[derive(Debug, Clone)]
pub struct PermissionStore {
    pool: PgPool,
    audit: AuditLog,
}

impl PermissionStore {
    #[must_use]
    pub fn new(pool: PgPool, audit: AuditLog) -> Self {
        Self { pool, audit }
    }

    /// Fetch a user's config row, flags included.
    pub async fn get_user_config(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> CoreResult<Option<UserConfig>> {
        let config = sqlx::query_as::<_, UserConfig>(
            "SELECT * FROM user_configs WHERE guild_id = $1 AND user_id = $2",
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("get_user_config", guild_id = guild_id, user_id = user_id))?;

        Ok(config)
    }

    /// Allow or revoke server management for `user_id`.
    pub async fn set_manage_servers(
        &self,
        guild_id: i64,
        actor_id: i64,
        user_id: i64,
        allowed: bool,
    ) -> CoreResult<AuditStatus> {
        self.update_flag(guild_id, user_id, "can_manage_servers", allowed)
            .await?;
        Ok(self
            .record_update(
                guild_id,
                actor_id,
                user_id,
                format!("can_manage_servers -> {allowed}"),
            )
            .await)
    }

    /// Allow or revoke panel user creation for `user_id`.
    pub async fn set_create_users(
        &self,
        guild_id: i64,
        actor_id: i64,
        user_id: i64,
        allowed: bool,
    ) -> CoreResult<AuditStatus> {
        self.update_flag(guild_id, user_id, "can_create_users", allowed)
            .await?;
        Ok(self
            .record_update(
                guild_id,
                actor_id,
                user_id,
                format!("can_create_users -> {allowed}"),
            )
            .await)
    }

    /// Set how many servers `user_id` may link.
    pub async fn set_max_servers(
        &self,
        guild_id: i64,
        actor_id: i64,
        user_id: i64,
        max_servers: i32,
    ) -> CoreResult<AuditStatus> {
        if max_servers < 0 {
            return Err(CoreError::Validation(
                "max_servers must not be negative".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE user_configs SET max_servers = $3, updated_at = NOW()
             WHERE guild_id = $1 AND user_id = $2",
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(max_servers)
        .execute(&self.pool)
        .await
        .map_err(db_error!("set_max_servers", guild_id = guild_id, user_id = user_id))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotConfigured);
        }

        Ok(self
            .record_update(
                guild_id,
                actor_id,
                user_id,
                format!("max_servers -> {max_servers}"),
            )
            .await)
    }

    /// Flip one boolean flag. The column name is one of two compile-time
    /// constants, never caller input.
    async fn update_flag(
        &self,
        guild_id: i64,
        user_id: i64,
        column: &'static str,
        value: bool,
    ) -> CoreResult<()> {
        let query = format!(
            "UPDATE user_configs SET {column} = $3, updated_at = NOW()
             WHERE guild_id = $1 AND user_id = $2"
        );

        let result = sqlx::query(&query)
            .bind(guild_id)
            .bind(user_id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(db_error!("update_flag", guild_id = guild_id, user_id = user_id))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotConfigured);
        }

        Ok(())
    }

    async fn record_update(
        &self,
        guild_id: i64,
        actor_id: i64,
        target_user_id: i64,
        detail: String,
    ) -> AuditStatus {
        let entry = NewAuditEntry {
            guild_id,
            user_id: actor_id,
            action: "permissions_update".to_string(),
            target: Some(format!("user:{target_user_id}")),
            result: AuditResult::Success,
            detail: Some(detail),
        };

        match self.audit.record(entry).await {
            Ok(_) => AuditStatus::Recorded,
            Err(e) => {
                warn!(guild_id, actor_id, error = %e, "Audit write failed");
                AuditStatus::Failed
            }
        }
    }
}
