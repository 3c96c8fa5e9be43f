//! User entity and DTOs.
//!
//! The secret-bearing columns (`hash`, `refresh_token`, `code`,
//! `email_token`, expiry stamps) never serialize into responses; they are
//! read from the database and consumed internally only.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::roles::model::Role;
use crate::utils::pagination::PaginationParams;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub is_archived: bool,
    #[serde(skip_serializing, default)]
    pub hash: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub code: Option<String>,
    #[serde(skip_serializing, default)]
    pub code_expire_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing, default)]
    pub email_verified_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing, default)]
    pub email_token: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// User plus their role, the shape most auth responses use.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<Role>,
}

/// Profile fields accepted at registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub image_url: Option<String>,
}

// `must_match` cannot target an `Option` sibling in validator 0.20, so the
// same check lives in a schema-level function.
fn validate_passwords_match(dto: &RegisterUserDto) -> Result<(), validator::ValidationError> {
    if let Some(confirm) = &dto.confirm_password {
        if dto.password.as_ref() != Some(confirm) {
            let mut err = validator::ValidationError::new("must_match");
            err.message = Some(std::borrow::Cow::from("Passwords do not match"));
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_passwords_match))]
pub struct RegisterUserDto {
    #[validate(nested)]
    pub user: RegisterUserInput,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub image_url: Option<String>,
    pub role_id: Option<Uuid>,
    #[validate(length(min = 4))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileDto {
    #[validate(length(min = 3, max = 20))]
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub image_url: Option<String>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordDto {
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserFilterParams {
    pub email: Option<String>,
    pub role_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: None,
            email: Some("a@b.com".to_string()),
            phone_number: None,
            first_name: None,
            last_name: None,
            image_url: None,
            role_id: None,
            is_active: true,
            is_archived: false,
            hash: Some("$2b$12$secret".to_string()),
            refresh_token: Some("$2b$12$refresh".to_string()),
            code: Some("ABC123".to_string()),
            code_expire_at: None,
            email_verified_at: None,
            email_token: Some("$2b$12$token".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_secret_fields_never_serialize() {
        let serialized = serde_json::to_string(&sample_user()).unwrap();
        assert!(serialized.contains("a@b.com"));
        assert!(!serialized.contains("hash"));
        assert!(!serialized.contains("refresh_token"));
        assert!(!serialized.contains("email_token"));
        assert!(!serialized.contains("ABC123"));
        assert!(!serialized.contains("secret"));
    }

    #[test]
    fn test_register_dto_password_mismatch_rejected() {
        let dto = RegisterUserDto {
            user: RegisterUserInput {
                email: "a@b.com".to_string(),
                username: None,
                first_name: None,
                last_name: None,
                phone_number: None,
                image_url: None,
            },
            password: Some("pass1".to_string()),
            confirm_password: Some("pass2".to_string()),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_register_dto_matching_passwords_accepted() {
        let dto = RegisterUserDto {
            user: RegisterUserInput {
                email: "a@b.com".to_string(),
                username: None,
                first_name: None,
                last_name: None,
                phone_number: None,
                image_url: None,
            },
            password: Some("pass1".to_string()),
            confirm_password: Some("pass1".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_register_dto_invalid_email_rejected() {
        let dto = RegisterUserDto {
            user: RegisterUserInput {
                email: "not-an-email".to_string(),
                username: None,
                first_name: None,
                last_name: None,
                phone_number: None,
                image_url: None,
            },
            password: None,
            confirm_password: None,
        };
        assert!(dto.validate().is_err());
    }
}
