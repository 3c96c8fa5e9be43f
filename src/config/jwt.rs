use std::env;

/// JWT secrets and expirations.
///
/// Access, refresh and email-verification tokens are signed with distinct
/// secrets so one leaking never compromises the others.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_secret: String,
    pub refresh_token_expiry: i64,
    pub verification_secret: String,
    pub verification_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // 1 hour
            refresh_secret: env::var("JWT_REFRESH_TOKEN_SECRET")
                .unwrap_or_else(|_| "your-refresh-secret-change-in-production".to_string()),
            refresh_token_expiry: env::var("JWT_REFRESH_TOKEN_EXPIRATION_TIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800), // 7 days
            verification_secret: env::var("JWT_VERIFICATION_TOKEN_SECRET")
                .unwrap_or_else(|_| "your-verification-secret-change-in-production".to_string()),
            verification_token_expiry: env::var("JWT_VERIFICATION_TOKEN_EXPIRATION_TIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // 1 hour
        }
    }
}
