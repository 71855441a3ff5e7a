//! Authorization decision logic.
//!
//! [`authorize`] is a pure function over its inputs: callers fetch the
//! guild and user rows and pass them in, so the decision is the same no
//! matter which command triggered it.

use thiserror::Error;

use super::Capability;
use crate::db::{GuildConfig, UserConfig};

/// The member attempting an action, as reported by the chat platform.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    /// Role ids the member holds in the guild.
    pub role_ids: Vec<i64>,
    /// Whether the platform grants this member the Administrator permission.
    pub is_administrator: bool,
}

impl Actor {
    /// Plain member with no roles and no platform admin bit.
    #[must_use]
    pub const fn member(user_id: i64) -> Self {
        Self {
            user_id,
            role_ids: Vec::new(),
            is_administrator: false,
        }
    }
}

/// A denied authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{} denied: {reason}", .capability.action_name())]
pub struct AuthorizationDenied {
    pub capability: Capability,
    pub reason: DenyReason,
}

/// Why an attempt was denied. Shown to the invoking user and recorded in
/// the audit entry's detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    /// The guild has not been set up yet.
    #[error("guild is not configured")]
    GuildNotConfigured,

    /// The actor has no user config that could grant the capability.
    #[error("panel credentials are not configured")]
    NotConfigured,

    /// Admin-only capability and the actor is not a guild admin.
    #[error("requires the guild admin role")]
    AdminRequired,

    /// The actor's config does not grant the capability.
    #[error("capability not granted")]
    CapabilityNotGranted,

    /// Linking another server would exceed the actor's quota.
    #[error("server quota reached ({linked}/{max_servers})")]
    QuotaExceeded { linked: i64, max_servers: i32 },
}

/// Decide whether `actor` may exercise `capability`.
///
/// Rule precedence, first match wins:
/// 1. the actor holds the guild's configured admin role, or is a platform
///    administrator when no admin role is configured: allows everything;
/// 2. the actor's own config flag grants the capability;
/// 3. deny.
pub fn authorize(
    actor: &Actor,
    guild: Option<&GuildConfig>,
    user: Option<&UserConfig>,
    capability: Capability,
) -> Result<(), AuthorizationDenied> {
    let deny = |reason| Err(AuthorizationDenied { capability, reason });

    let Some(guild) = guild else {
        return deny(DenyReason::GuildNotConfigured);
    };

    // Rule 1: guild admin override.
    match guild.admin_role_id {
        Some(role_id) if actor.role_ids.contains(&role_id) => return Ok(()),
        None if actor.is_administrator => return Ok(()),
        _ => {}
    }

    // Rule 2: the actor's own capability flag.
    if capability.user_grantable() {
        let Some(user) = user else {
            return deny(DenyReason::NotConfigured);
        };

        let granted = match capability {
            Capability::ManageServers => user.can_manage_servers,
            Capability::CreateUsers => user.can_create_users,
            Capability::ViewAuditLog | Capability::ManageGuild => false,
        };

        if granted {
            return Ok(());
        }
        return deny(DenyReason::CapabilityNotGranted);
    }

    deny(DenyReason::AdminRequired)
}

/// Counting check for linking another server.
///
/// `linked` is the actor's current link count; linking requires
/// `linked < max_servers`. Separate from [`authorize`] because it gates a
/// single operation, not a capability.
pub fn check_server_quota(linked: i64, max_servers: i32) -> Result<(), AuthorizationDenied> {
    if linked < i64::from(max_servers) {
        Ok(())
    } else {
        Err(AuthorizationDenied {
            capability: Capability::ManageServers,
            reason: DenyReason::QuotaExceeded {
                linked,
                max_servers,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn guild(admin_role_id: Option<i64>) -> GuildConfig {
        GuildConfig {
            guild_id: 1,
            admin_role_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user_config(can_manage_servers: bool, can_create_users: bool) -> UserConfig {
        UserConfig {
            guild_id: 1,
            user_id: 10,
            encrypted_panel_url: String::new(),
            encrypted_api_key: String::new(),
            can_manage_servers,
            can_create_users,
            max_servers: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_role_beats_missing_flag() {
        // Holder of the admin role lacking can_create_users is still
        // allowed: rule 1 wins over rule 2.
        let actor = Actor {
            user_id: 10,
            role_ids: vec![99],
            is_administrator: false,
        };
        let guild = guild(Some(99));
        let user = user_config(true, false);

        let result = authorize(&actor, Some(&guild), Some(&user), Capability::CreateUsers);
        assert!(result.is_ok());
    }

    #[test]
    fn test_platform_admin_only_counts_without_configured_role() {
        let actor = Actor {
            user_id: 10,
            role_ids: vec![],
            is_administrator: true,
        };

        // No admin role configured: the platform Administrator bit rules.
        assert!(authorize(&actor, Some(&guild(None)), None, Capability::ManageGuild).is_ok());

        // Admin role configured: the bit no longer overrides.
        let result = authorize(&actor, Some(&guild(Some(99))), None, Capability::ManageGuild);
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::AdminRequired
        );
    }

    #[test]
    fn test_user_flag_grants_capability() {
        let actor = Actor::member(10);
        let guild = guild(Some(99));

        let granted = user_config(true, false);
        assert!(authorize(&actor, Some(&guild), Some(&granted), Capability::ManageServers).is_ok());

        let revoked = user_config(false, false);
        let result = authorize(&actor, Some(&guild), Some(&revoked), Capability::ManageServers);
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::CapabilityNotGranted
        );
    }

    #[test]
    fn test_admin_only_capability_denied_for_plain_member() {
        let actor = Actor::member(10);
        let user = user_config(true, true);

        let result = authorize(
            &actor,
            Some(&guild(Some(99))),
            Some(&user),
            Capability::ViewAuditLog,
        );
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::AdminRequired
        );
    }

    #[test]
    fn test_unconfigured_guild_and_user_denied() {
        let actor = Actor::member(10);

        let result = authorize(&actor, None, None, Capability::ManageServers);
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::GuildNotConfigured
        );

        let result = authorize(&actor, Some(&guild(Some(99))), None, Capability::ManageServers);
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::NotConfigured
        );
    }

    #[test]
    fn test_server_quota_counts_not_flags() {
        assert!(check_server_quota(0, 2).is_ok());
        assert!(check_server_quota(1, 2).is_ok());

        // At the limit, linking one more is denied.
        let result = check_server_quota(2, 2);
        assert_eq!(
            result.expect_err("should be denied").reason,
            DenyReason::QuotaExceeded {
                linked: 2,
                max_servers: 2
            }
        );

        assert!(check_server_quota(0, 0).is_err());
    }
}
