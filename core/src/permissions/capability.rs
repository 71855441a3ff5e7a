//! Capabilities checked before proxying a command to the panel.

/// A named permission grantable per user.
///
/// `ManageServers` and `CreateUsers` can be granted through a user's own
/// config flags; the rest require the guild admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Power actions, console commands, and resource queries on linked servers
    ManageServers,
    /// Creating, updating, and deleting panel users
    CreateUsers,
    /// Reading the guild audit log
    ViewAuditLog,
    /// Guild setup, admin-role changes, and user config resets
    ManageGuild,
}

impl Capability {
    /// Returns the action name for audit logging.
    ///
    /// Denied attempts are recorded under these names.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::ManageServers => "manage_servers",
            Self::CreateUsers => "create_users",
            Self::ViewAuditLog => "view_audit_log",
            Self::ManageGuild => "manage_guild",
        }
    }

    /// Whether a per-user config flag can grant this capability.
    ///
    /// Admin-only capabilities return `false`: only the guild admin role
    /// (or a platform administrator) allows them.
    #[must_use]
    pub const fn user_grantable(&self) -> bool {
        matches!(self, Self::ManageServers | Self::CreateUsers)
    }

    /// Returns all capabilities as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ManageServers,
            Self::CreateUsers,
            Self::ViewAuditLog,
            Self::ManageGuild,
        ]
    }

    /// Returns a human-readable description of the capability.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ManageServers => "Manage linked panel servers",
            Self::CreateUsers => "Create and manage panel users",
            Self::ViewAuditLog => "View the guild audit log",
            Self::ManageGuild => "Administer the bot for this guild",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_snake_case() {
        for capability in Capability::all() {
            let name = capability.action_name();
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "Action name '{}' should be snake_case",
                name
            );
        }
    }

    #[test]
    fn test_admin_only_capabilities_are_not_user_grantable() {
        assert!(Capability::ManageServers.user_grantable());
        assert!(Capability::CreateUsers.user_grantable());
        assert!(!Capability::ViewAuditLog.user_grantable());
        assert!(!Capability::ManageGuild.user_grantable());
    }
}
