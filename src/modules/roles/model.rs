use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::role_permissions::model::RolePermission;
use crate::utils::pagination::PaginationParams;

/// Built-in role names. Custom roles are plain strings in the database; only
/// these two get special treatment (seeded, undeletable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleName {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::User => "USER",
        }
    }
}

/// Names of roles that ship with the system and can never be deleted.
pub const SYSTEM_DEFAULT_ROLES: [&str; 2] = ["ADMIN", "USER"];

/// True when a role must survive delete requests: either flagged `is_system`
/// or carrying one of the shipped default names.
pub fn is_protected_role(name: &str, is_system: bool) -> bool {
    is_system || SYSTEM_DEFAULT_ROLES.contains(&name)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub is_system: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Role together with its permission rows, as returned by detail endpoints
/// and consumed at token-issuance time.
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub role_permissions: Vec<RolePermission>,
}

impl RoleWithPermissions {
    /// Names of the enabled permission rows — the snapshot that goes into a
    /// freshly issued access token.
    pub fn enabled_permission_names(&self) -> Vec<String> {
        self.role_permissions
            .iter()
            .filter(|rp| rp.enabled)
            .map(|rp| rp.permission.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleDto {
    #[validate(length(min = 1, message = "Role name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleDto {
    #[validate(length(min = 1, message = "Role name must not be empty"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleFilterParams {
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_roles() {
        assert!(is_protected_role("ADMIN", false));
        assert!(is_protected_role("USER", false));
        assert!(is_protected_role("AUDITOR", true));
        assert!(!is_protected_role("AUDITOR", false));
    }

    #[test]
    fn test_role_name_wire_format() {
        assert_eq!(
            serde_json::to_string(&RoleName::Admin).unwrap(),
            r#""ADMIN""#
        );
        assert_eq!(serde_json::to_string(&RoleName::User).unwrap(), r#""USER""#);
    }

    #[test]
    fn test_enabled_permission_names_filters_disabled() {
        use crate::modules::role_permissions::model::RolePermission;

        let role = Role {
            id: Uuid::new_v4(),
            name: "ADMIN".to_string(),
            is_system: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let role_id = role.id;
        let mk = |permission: &str, enabled: bool| RolePermission {
            id: Uuid::new_v4(),
            role_id,
            permission: permission.to_string(),
            enabled,
            description: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let with_permissions = RoleWithPermissions {
            role,
            role_permissions: vec![
                mk("USERS_VIEW", true),
                mk("USERS_EDIT", false),
                mk("PROFILE_EDIT", true),
            ],
        };
        assert_eq!(
            with_permissions.enabled_permission_names(),
            vec!["USERS_VIEW".to_string(), "PROFILE_EDIT".to_string()]
        );
    }
}
