//! Database Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Guild configuration.
///
/// Created on first admin setup. Never hard-deleted: a reset only clears
/// the admin role so the guild's audit history stays intact.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: i64,
    /// Role allowed to administer the bot; `None` falls back to members
    /// holding the platform Administrator permission.
    pub admin_role_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user panel configuration.
///
/// Credential fields hold encrypted blobs; plaintext never reaches the
/// database. Owned by the user who created it, mutated only by that user
/// or a guild admin.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserConfig {
    pub guild_id: i64,
    pub user_id: i64,
    pub encrypted_panel_url: String,
    pub encrypted_api_key: String,
    pub can_manage_servers: bool,
    pub can_create_users: bool,
    pub max_servers: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cached link between a guild member and a panel server.
///
/// Derived data: safe to drop and repopulate from the panel API. Counts
/// against the owner's `max_servers` quota.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServerLink {
    pub guild_id: i64,
    pub user_id: i64,
    pub server_identifier: String,
    pub friendly_name: String,
    pub last_seen_at: DateTime<Utc>,
}
