//! Audit Log
//!
//! Append-only record of every privileged action's attempt and outcome.
//! Entries are never updated; they are only removed by retention cleanup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, QueryBuilder};
use thiserror::Error;
use tracing::info;

use crate::db::db_error;
use crate::error::CoreResult;

/// Outcome recorded for an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_result", rename_all = "lowercase")]
pub enum AuditResult {
    Success,
    Failure,
}

/// One privileged action's attempt and outcome.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub guild_id: i64,
    /// The acting member.
    pub user_id: i64,
    pub action: String,
    /// What the action was aimed at (a server identifier, a target user),
    /// when there is one.
    pub target: Option<String>,
    pub result: AuditResult,
    /// Redacted description. Hostnames at most; never URLs or API keys.
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for [`AuditLog::record`].
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub guild_id: i64,
    pub user_id: i64,
    pub action: String,
    pub target: Option<String>,
    pub result: AuditResult,
    pub detail: Option<String>,
}

/// Whether the audit side effect of a store call was persisted.
///
/// `Failed` means the primary action went through but its audit entry did
/// not; callers surface that as a secondary warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Recorded,
    Failed,
}

/// Audit persistence failure.
///
/// Never the primary failure of a command, and never rolls back or blocks
/// the action it was recording.
#[derive(Debug, Error)]
#[error("Audit write failed")]
pub struct AuditWriteError(#[from] sqlx::Error);

/// Optional query filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<i64>,
    /// Matches actions starting with this prefix.
    pub action: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Handle for the append-only audit trail.
#[derive(Debug, Clone)]
pub struct AuditLog {
    pool: PgPool,
}

impl AuditLog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditWriteError> {
        let recorded = sqlx::query_as::<_, AuditLogEntry>(
            r"
            INSERT INTO audit_logs (guild_id, user_id, action, target, result, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(entry.guild_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.target)
        .bind(entry.result)
        .bind(&entry.detail)
        .fetch_one(&self.pool)
        .await?;

        Ok(recorded)
    }

    /// Get audit entries for a guild, newest first.
    ///
    /// Entries from other guilds are never visible.
    pub async fn query(
        &self,
        guild_id: i64,
        filter: &AuditFilter,
        limit: i64,
        offset: i64,
    ) -> CoreResult<Vec<AuditLogEntry>> {
        let mut builder =
            QueryBuilder::new("SELECT * FROM audit_logs WHERE guild_id = ");
        builder.push_bind(guild_id);

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(action) = &filter.action {
            builder.push(" AND action LIKE ").push_bind(format!("{action}%"));
        }
        if let Some(since) = filter.since {
            builder.push(" AND created_at >= ").push_bind(since);
        }
        if let Some(until) = filter.until {
            builder.push(" AND created_at < ").push_bind(until);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let entries = builder
            .build_query_as::<AuditLogEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error!("audit_query", guild_id = guild_id))?;

        Ok(entries)
    }

    /// Delete entries older than the cutoff, returning the deleted count.
    pub async fn retention_cleanup(&self, older_than: DateTime<Utc>) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(db_error!("audit_retention_cleanup", cutoff = %older_than))?;

        let deleted = result.rows_affected();
        info!(deleted, cutoff = %older_than, "Audit retention cleanup completed");
        Ok(deleted)
    }
}
