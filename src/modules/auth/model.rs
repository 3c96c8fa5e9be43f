//! Token claims and auth request/response shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::UserWithRole;

/// Claims carried by an access token. `role` and `permissions` are snapshots
/// taken at issuance; authorization checks against them go stale until the
/// next login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. The token itself is additionally
/// bcrypt-hashed onto the user row, so a stolen refresh token dies with the
/// next logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by email verification and password reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserWithRole,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequestDto {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequestDto {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailTokenDto {
    #[validate(length(min = 1, message = "Verification token is required"))]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailCodeDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

/// `?roles=ADMIN,MANAGER` — comma-separated, whitespace tolerated.
#[derive(Debug, Clone, Deserialize)]
pub struct HasRoleQuery {
    pub roles: String,
}

impl HasRoleQuery {
    pub fn names(&self) -> Vec<String> {
        split_csv(&self.roles)
    }
}

/// `?permissions=USERS_VIEW,USERS_EDIT`.
#[derive(Debug, Clone, Deserialize)]
pub struct HasPermissionsQuery {
    pub permissions: String,
}

impl HasPermissionsQuery {
    pub fn names(&self) -> Vec<String> {
        split_csv(&self.permissions)
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_query_parsing() {
        let q = HasRoleQuery {
            roles: "ADMIN, MANAGER ,,USER".to_string(),
        };
        assert_eq!(q.names(), vec!["ADMIN", "MANAGER", "USER"]);

        let q = HasPermissionsQuery {
            permissions: "".to_string(),
        };
        assert!(q.names().is_empty());
    }

    #[test]
    fn test_access_claims_omit_empty_snapshot() {
        let claims = AccessClaims {
            id: Uuid::new_v4(),
            role: None,
            permissions: None,
            iat: 0,
            exp: 0,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("role"));
        assert!(!json.contains("permissions"));
    }

    #[test]
    fn test_change_password_requires_confirmation() {
        let dto = ChangePasswordRequestDto {
            token: "t".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
