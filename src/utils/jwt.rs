//! Token mint and verify helpers.
//!
//! Three token families, each signed HS256 with its own secret: access
//! (authorization snapshot), refresh (re-issuance), verification (email
//! confirmation and password reset links).

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::{AccessClaims, RefreshClaims, VerificationClaims};
use crate::utils::errors::AppError;

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn create_access_token(
    config: &JwtConfig,
    user_id: Uuid,
    role: Option<String>,
    permissions: Option<Vec<String>>,
) -> Result<String, AppError> {
    let iat = now_ts();
    let claims = AccessClaims {
        id: user_id,
        role,
        permissions,
        iat,
        exp: iat + config.access_token_expiry,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn verify_access_token(config: &JwtConfig, token: &str) -> Result<AccessClaims, AppError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

pub fn create_refresh_token(
    config: &JwtConfig,
    user_id: Uuid,
    email: Option<String>,
    role: Option<String>,
) -> Result<String, AppError> {
    let iat = now_ts();
    let claims = RefreshClaims {
        id: user_id,
        email,
        role,
        iat,
        exp: iat + config.refresh_token_expiry,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn verify_refresh_token(config: &JwtConfig, token: &str) -> Result<RefreshClaims, AppError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))
}

pub fn create_verification_token(
    config: &JwtConfig,
    user_id: Uuid,
    email: &str,
) -> Result<String, AppError> {
    let iat = now_ts();
    let claims = VerificationClaims {
        id: user_id,
        email: email.to_string(),
        iat,
        exp: iat + config.verification_token_expiry,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.verification_secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn verify_verification_token(
    config: &JwtConfig,
    token: &str,
) -> Result<VerificationClaims, AppError> {
    decode::<VerificationClaims>(
        token,
        &DecodingKey::from_secret(config.verification_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired verification token"))
}

/// Pulls the bearer token out of an `Authorization` header value.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "access-secret".to_string(),
            access_token_expiry: 3600,
            refresh_secret: "refresh-secret".to_string(),
            refresh_token_expiry: 604800,
            verification_secret: "verification-secret".to_string(),
            verification_token_expiry: 3600,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let config = test_config();
        let id = Uuid::new_v4();
        let token = create_access_token(
            &config,
            id,
            Some("ADMIN".to_string()),
            Some(vec!["USERS_VIEW".to_string()]),
        )
        .unwrap();
        let claims = verify_access_token(&config, &token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.role.as_deref(), Some("ADMIN"));
        assert_eq!(claims.permissions, Some(vec!["USERS_VIEW".to_string()]));
    }

    #[test]
    fn test_token_families_do_not_cross_verify() {
        let config = test_config();
        let id = Uuid::new_v4();
        let refresh = create_refresh_token(&config, id, None, None).unwrap();
        assert!(verify_access_token(&config, &refresh).is_err());

        let verification = create_verification_token(&config, id, "a@b.com").unwrap();
        assert!(verify_refresh_token(&config, &verification).is_err());
    }

    #[test]
    fn test_verification_token_carries_email() {
        let config = test_config();
        let id = Uuid::new_v4();
        let token = create_verification_token(&config, id, "a@b.com").unwrap();
        let claims = verify_verification_token(&config, &token).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.id, id);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
