//! Permission system.
//!
//! A guild's configured admin role overrides everything; otherwise the
//! actor's own capability flags decide. All checks flow through
//! [`authorize`] so enforcement cannot drift between call sites.

mod capability;
mod resolver;
mod store;

pub use capability::Capability;
pub use resolver::{authorize, check_server_quota, Actor, AuthorizationDenied, DenyReason};
pub use store::PermissionStore;

use tracing::warn;

use crate::audit::{AuditLog, AuditResult, NewAuditEntry};
use crate::db::{GuildConfig, UserConfig};

/// Wraps [`authorize`] so every denial lands in the audit log as a failed
/// attempt, exactly once. Allowed checks record nothing.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    audit: AuditLog,
}

impl Gatekeeper {
    #[must_use]
    pub fn new(audit: AuditLog) -> Self {
        Self { audit }
    }

    /// Authorize `actor` for `capability`, recording any denial.
    ///
    /// `guild_id` is passed separately so denials in unconfigured guilds
    /// are still attributable. A failed audit write downgrades to a
    /// warning; the denial itself is still returned.
    pub async fn require(
        &self,
        guild_id: i64,
        actor: &Actor,
        guild: Option<&GuildConfig>,
        user: Option<&UserConfig>,
        capability: Capability,
    ) -> Result<(), AuthorizationDenied> {
        match authorize(actor, guild, user, capability) {
            Ok(()) => Ok(()),
            Err(denied) => {
                self.record_denial(guild_id, actor.user_id, &denied).await;
                Err(denied)
            }
        }
    }

    /// Enforce the server-link quota, recording any denial.
    ///
    /// Evaluated before any panel API call is made.
    pub async fn require_quota(
        &self,
        guild_id: i64,
        user_id: i64,
        linked: i64,
        max_servers: i32,
    ) -> Result<(), AuthorizationDenied> {
        match check_server_quota(linked, max_servers) {
            Ok(()) => Ok(()),
            Err(denied) => {
                self.record_denial(guild_id, user_id, &denied).await;
                Err(denied)
            }
        }
    }

    async fn record_denial(&self, guild_id: i64, user_id: i64, denied: &AuthorizationDenied) {
        let entry = NewAuditEntry {
            guild_id,
            user_id,
            action: denied.capability.action_name().to_string(),
            target: None,
            result: AuditResult::Failure,
            detail: Some(denied.reason.to_string()),
        };

        if let Err(e) = self.audit.record(entry).await {
            warn!(guild_id, user_id, error = %e, "Audit write failed for denied attempt");
        }
    }
}
