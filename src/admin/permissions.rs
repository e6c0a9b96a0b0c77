/// Admin roles and permission resolution
use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};

/// Admin role levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to applicant-facing resources
    Staff,
    /// Moderation access, no admin-user management
    Manager,
    /// Most admin actions, including creating admin users
    Admin,
    /// Full access, including deleting admin users
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn from_str(s: &str) -> PortalResult<Self> {
        match s.to_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            _ => Err(PortalError::Validation(format!("Invalid role: {}", s))),
        }
    }

    /// Default permission names granted by this role
    pub fn default_permissions(&self) -> Vec<&'static str> {
        match self {
            Role::Staff => vec![
                "timeline.read",
                "feedback.read",
                "checklist.read",
                "messages.read",
            ],
            Role::Manager => vec![
                "admins.read",
                "timeline.read",
                "timeline.moderate",
                "feedback.read",
                "feedback.moderate",
                "checklist.read",
                "checklist.manage",
                "messages.read",
                "messages.send",
            ],
            Role::Admin => vec![
                "admins.read",
                "admins.create",
                "admins.update",
                "timeline.read",
                "timeline.moderate",
                "feedback.read",
                "feedback.moderate",
                "checklist.read",
                "checklist.manage",
                "messages.read",
                "messages.send",
            ],
            Role::SuperAdmin => vec![
                "admins.read",
                "admins.create",
                "admins.update",
                "admins.delete",
                "timeline.read",
                "timeline.moderate",
                "feedback.read",
                "feedback.moderate",
                "checklist.read",
                "checklist.manage",
                "messages.read",
                "messages.send",
            ],
        }
    }
}

/// Resolved permission set for an admin
///
/// Resolved once at login (role defaults layered with per-user overrides)
/// and snapshotted into the session row for its lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    names: Vec<String>,
}

impl PermissionSet {
    /// Resolve the effective permissions for a role plus per-user overrides
    ///
    /// Overrides are a JSON object mapping permission name to bool:
    /// true grants a permission the role lacks, false revokes a default.
    pub fn resolve(role: Role, overrides: &serde_json::Value) -> Self {
        let mut names: Vec<String> = role
            .default_permissions()
            .into_iter()
            .map(String::from)
            .collect();

        if let Some(map) = overrides.as_object() {
            for (name, value) in map {
                match value.as_bool() {
                    Some(true) => {
                        if !names.iter().any(|n| n == name) {
                            names.push(name.clone());
                        }
                    }
                    Some(false) => {
                        names.retain(|n| n != name);
                    }
                    None => {
                        // Non-boolean override values are ignored
                    }
                }
            }
        }

        Self { names }
    }

    /// Exact-match membership test over the resolved set
    pub fn allows(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Serialize to the JSON array stored on the session row
    pub fn to_json(&self) -> PortalResult<String> {
        serde_json::to_string(&self.names)
            .map_err(|e| PortalError::Internal(format!("Failed to serialize permissions: {}", e)))
    }

    /// Parse the JSON array stored on the session row
    pub fn from_json(json: &str) -> PortalResult<Self> {
        let names: Vec<String> = serde_json::from_str(json)
            .map_err(|e| PortalError::Internal(format!("Invalid permission snapshot: {}", e)))?;

        Ok(Self { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("staff").unwrap(), Role::Staff);
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("super_admin").unwrap(), Role::SuperAdmin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);

        assert!(Role::from_str("invalid").is_err());
    }

    #[test]
    fn test_role_defaults() {
        let staff = PermissionSet::resolve(Role::Staff, &json!({}));
        assert!(staff.allows("timeline.read"));
        assert!(!staff.allows("timeline.moderate"));
        assert!(!staff.allows("admins.read"));

        let super_admin = PermissionSet::resolve(Role::SuperAdmin, &json!({}));
        assert!(super_admin.allows("admins.delete"));
    }

    #[test]
    fn test_overrides_grant_and_revoke() {
        let overrides = json!({
            "timeline.moderate": true,
            "feedback.read": false,
        });
        let set = PermissionSet::resolve(Role::Staff, &overrides);

        assert!(set.allows("timeline.moderate"));
        assert!(!set.allows("feedback.read"));
        // Untouched defaults survive
        assert!(set.allows("checklist.read"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let set = PermissionSet::resolve(Role::Manager, &json!({}));
        let json = set.to_json().unwrap();
        let parsed = PermissionSet::from_json(&json).unwrap();

        assert_eq!(set.names(), parsed.names());
    }

    #[test]
    fn test_missing_permission_is_denied() {
        let set = PermissionSet::resolve(Role::Manager, &json!({}));
        assert!(!set.allows("admins.delete"));
        assert!(!set.allows("nonexistent.permission"));
    }
}
