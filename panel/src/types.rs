//! Panel API payload types.

use serde::{Deserialize, Serialize};

/// Power signals accepted by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSignal {
    Start,
    Stop,
    Restart,
    Kill,
}

impl PowerSignal {
    /// Wire value sent to the panel.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Kill => "kill",
        }
    }

    /// Audit action name for this signal.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::Start => "server_start",
            Self::Stop => "server_stop",
            Self::Restart => "server_restart",
            Self::Kill => "server_kill",
        }
    }
}

/// Server power states reported by the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Running,
    #[default]
    Stopped,
    Starting,
    Stopping,
    Restarting,
}

/// Resource limits configured for a server.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Limits {
    /// Memory limit in MiB; 0 means unlimited
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub swap: i64,
    /// Disk limit in MiB
    #[serde(default)]
    pub disk: i64,
    /// CPU limit in percent; 0 means unlimited
    #[serde(default)]
    pub cpu: i64,
}

/// A server as returned by the application API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub id: i64,
    pub name: String,
    /// Short identifier used in console and power endpoints.
    pub identifier: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: PowerState,
    #[serde(default)]
    pub limits: Limits,
}

/// Live resource usage for a server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceUsage {
    #[serde(default)]
    pub current_state: PowerState,
    #[serde(default)]
    pub resources: ResourceMetrics,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ResourceMetrics {
    #[serde(default)]
    pub memory_bytes: u64,
    #[serde(default)]
    pub cpu_absolute: f64,
    #[serde(default)]
    pub disk_bytes: u64,
    #[serde(default)]
    pub network_rx_bytes: u64,
    #[serde(default)]
    pub network_tx_bytes: u64,
    /// Milliseconds since the server started.
    #[serde(default)]
    pub uptime: u64,
}

/// A panel user account.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub root_admin: bool,
    #[serde(default)]
    pub created_at: String,
}

/// Payload for creating a panel user.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Typed patch for updating a panel user.
///
/// Unset fields are left unchanged; there is no update-by-field-name path.
#[derive(Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_admin: Option<bool>,
}

impl UserUpdate {
    /// Whether the patch changes anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.language.is_none()
            && self.password.is_none()
            && self.root_admin.is_none()
    }
}

impl std::fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUpdate")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("language", &self.language)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("root_admin", &self.root_admin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_signal_wire_values() {
        assert_eq!(PowerSignal::Start.as_str(), "start");
        assert_eq!(PowerSignal::Kill.as_str(), "kill");
        assert_eq!(PowerSignal::Restart.action_name(), "server_restart");
    }

    #[test]
    fn test_server_info_parses_panel_attributes() {
        let attributes = serde_json::json!({
            "id": 7,
            "external_id": null,
            "name": "survival",
            "identifier": "d3aac109",
            "description": "",
            "state": "running",
            "limits": { "memory": 2048, "swap": 0, "disk": 10240, "io": 500, "cpu": 200 }
        });

        let server: ServerInfo =
            serde_json::from_value(attributes).expect("attributes should parse");
        assert_eq!(server.id, 7);
        assert_eq!(server.identifier, "d3aac109");
        assert_eq!(server.state, PowerState::Running);
        assert_eq!(server.limits.memory, 2048);
    }

    #[test]
    fn test_missing_state_defaults_to_stopped() {
        let attributes = serde_json::json!({
            "id": 7,
            "name": "survival",
            "identifier": "d3aac109"
        });

        let server: ServerInfo =
            serde_json::from_value(attributes).expect("attributes should parse");
        assert_eq!(server.state, PowerState::Stopped);
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let patch = UserUpdate {
            email: Some("new@example.com".to_string()),
            ..UserUpdate::default()
        };
        assert!(!patch.is_empty());

        let body = serde_json::to_value(&patch).expect("patch should serialize");
        assert_eq!(
            body,
            serde_json::json!({ "email": "new@example.com" })
        );

        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn test_debug_never_shows_passwords() {
        let user = NewUser {
            username: "steve".to_string(),
            email: "steve@example.com".to_string(),
            first_name: "Steve".to_string(),
            last_name: "M".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{user:?}").contains("hunter2"));

        let patch = UserUpdate {
            password: Some("hunter2".to_string()),
            ..UserUpdate::default()
        };
        assert!(!format!("{patch:?}").contains("hunter2"));
    }
}
