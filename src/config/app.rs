use std::env;

/// Application-level settings that do not belong to a single subsystem.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the client application; used to build password-reset and
    /// email-confirmation links.
    pub client_base_url: String,
    pub bcrypt_cost: u32,
    /// Seconds a password-reset request stays valid.
    pub password_reset_expiry: i64,
    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            client_base_url: env::var("CLIENT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            bcrypt_cost: env::var("USER_PASSWORD_BCRYPT_SALT_ROUNDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            password_reset_expiry: env::var("PASSWORD_RESET_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800), // 30 minutes
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:4200".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}
