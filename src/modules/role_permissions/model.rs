use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::roles::model::RoleName;
use crate::utils::pagination::PaginationParams;

/// The closed set of permission identifiers the system knows about.
///
/// Stored and transmitted in SCREAMING_SNAKE form (`USERS_VIEW`, ...); the
/// database column stays TEXT so rows with retired identifiers keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    AdminEdit,
    UsersView,
    UsersEdit,
    ProfileEdit,
    ChangeRolesPermissions,
    FileStorageView,
    AccessDeleteAccount,
    AccessDeleteAllData,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::AdminEdit,
        Permission::UsersView,
        Permission::UsersEdit,
        Permission::ProfileEdit,
        Permission::ChangeRolesPermissions,
        Permission::FileStorageView,
        Permission::AccessDeleteAccount,
        Permission::AccessDeleteAllData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AdminEdit => "ADMIN_EDIT",
            Permission::UsersView => "USERS_VIEW",
            Permission::UsersEdit => "USERS_EDIT",
            Permission::ProfileEdit => "PROFILE_EDIT",
            Permission::ChangeRolesPermissions => "CHANGE_ROLES_PERMISSIONS",
            Permission::FileStorageView => "FILE_STORAGE_VIEW",
            Permission::AccessDeleteAccount => "ACCESS_DELETE_ACCOUNT",
            Permission::AccessDeleteAllData => "ACCESS_DELETE_ALL_DATA",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Route-authorization match: true when at least one enabled row matches any
/// of the required permissions. This OR-match is the canonical endpoint
/// policy; `RequestContext::has_permissions` keeps its stricter all-of check.
pub fn any_enabled_match(rows: &[RolePermission], required: &[Permission]) -> bool {
    rows.iter()
        .any(|rp| rp.enabled && required.iter().any(|p| p.as_str() == rp.permission))
}

/// The ADMIN role ships with the full permission set enabled; its rows are
/// read-only through the management endpoints.
pub fn is_locked_permission_set(role_name: &str) -> bool {
    role_name == RoleName::Admin.as_str()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRolePermissionDto {
    pub role_id: Uuid,
    pub permission: Permission,
    #[serde(default)]
    pub enabled: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRolePermissionDto {
    pub enabled: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolePermissionFilterParams {
    pub role_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(permission: &str, enabled: bool) -> RolePermission {
        RolePermission {
            id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            permission: permission.to_string(),
            enabled,
            description: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_permission_wire_format() {
        assert_eq!(
            serde_json::to_string(&Permission::ChangeRolesPermissions).unwrap(),
            r#""CHANGE_ROLES_PERMISSIONS""#
        );
        let parsed: Permission = serde_json::from_str(r#""USERS_VIEW""#).unwrap();
        assert_eq!(parsed, Permission::UsersView);
    }

    #[test]
    fn test_from_str_roundtrip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
        assert!("NOT_A_PERMISSION".parse::<Permission>().is_err());
    }

    #[test]
    fn test_any_enabled_match_is_or() {
        let rows = vec![row("USERS_VIEW", true)];
        // One held permission satisfies a two-permission requirement.
        assert!(any_enabled_match(
            &rows,
            &[Permission::UsersView, Permission::UsersEdit]
        ));
    }

    #[test]
    fn test_disabled_rows_never_match() {
        let rows = vec![row("USERS_VIEW", false)];
        assert!(!any_enabled_match(&rows, &[Permission::UsersView]));
    }

    #[test]
    fn test_no_rows_no_match() {
        assert!(!any_enabled_match(&[], &[Permission::UsersView]));
    }

    #[test]
    fn test_admin_permission_set_is_locked() {
        assert!(is_locked_permission_set("ADMIN"));
        assert!(!is_locked_permission_set("USER"));
        assert!(!is_locked_permission_set("AUDITOR"));
    }
}
