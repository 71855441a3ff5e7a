//! Server Link Cache
//!
//! Links between guild members and their panel servers. Derived data,
//! safe to drop and repopulate from the panel API, but the link count
//! feeds the `max_servers` quota check, so it is kept current on every
//! sighting.

use sqlx::PgPool;

use crate::db::{db_error, ServerLink};
use crate::error::CoreResult;

/// Handle for the server link cache.
#[derive(Debug, Clone)]
pub struct ServerLinkStore {
    pool: PgPool,
}

impl ServerLinkStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a link, refreshing the name and last-seen timestamp when it
    /// already exists.
    pub async fn link_server(
        &self,
        guild_id: i64,
        user_id: i64,
        server_identifier: &str,
        friendly_name: &str,
    ) -> CoreResult<ServerLink> {
        let link = sqlx::query_as::<_, ServerLink>(
            r"
            INSERT INTO server_links (guild_id, user_id, server_identifier, friendly_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, user_id, server_identifier) DO UPDATE
                SET friendly_name = EXCLUDED.friendly_name,
                    last_seen_at = NOW()
            RETURNING *
            ",
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(server_identifier)
        .bind(friendly_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error!("link_server", guild_id = guild_id, user_id = user_id))?;

        Ok(link)
    }

    /// Remove a link. Idempotent: returns whether anything was removed.
    pub async fn unlink_server(
        &self,
        guild_id: i64,
        user_id: i64,
        server_identifier: &str,
    ) -> CoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM server_links
             WHERE guild_id = $1 AND user_id = $2 AND server_identifier = $3",
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(server_identifier)
        .execute(&self.pool)
        .await
        .map_err(db_error!("unlink_server", guild_id = guild_id, user_id = user_id))?;

        Ok(result.rows_affected() > 0)
    }

    /// Current link count for a user; input to the quota check.
    pub async fn linked_count(&self, guild_id: i64, user_id: i64) -> CoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM server_links WHERE guild_id = $1 AND user_id = $2",
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error!("linked_count", guild_id = guild_id, user_id = user_id))?;

        Ok(count)
    }

    /// All of a user's links, by name.
    pub async fn list_links(&self, guild_id: i64, user_id: i64) -> CoreResult<Vec<ServerLink>> {
        let links = sqlx::query_as::<_, ServerLink>(
            "SELECT * FROM server_links WHERE guild_id = $1 AND user_id = $2
             ORDER BY friendly_name",
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error!("list_links", guild_id = guild_id, user_id = user_id))?;

        Ok(links)
    }
}
