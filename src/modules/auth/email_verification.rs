//! Email confirmation: link with a signed token, plus a short numeric code
//! for clients that can't follow links. Both are stored hashed on the user
//! row; the code additionally expires on its own clock.

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::app::AppConfig;
use crate::config::jwt::JwtConfig;
use crate::modules::users::model::User;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_verification_token, verify_verification_token};
use crate::utils::password::{hash_password, verify_password};

const CODE_LENGTH: usize = 6;

#[derive(Clone)]
pub struct EmailVerificationService {
    db: PgPool,
    jwt: JwtConfig,
    app: AppConfig,
    email: EmailService,
}

impl EmailVerificationService {
    pub fn new(db: PgPool, jwt: JwtConfig, app: AppConfig, email: EmailService) -> Self {
        Self {
            db,
            jwt,
            app,
            email,
        }
    }

    /// Issues a fresh token and code for `user`, stores their hashes and
    /// sends the verification mail.
    #[instrument(skip(self, user))]
    pub async fn send_email_verification(&self, user: &User) -> Result<(), AppError> {
        let email = user
            .email
            .as_deref()
            .ok_or_else(|| AppError::bad_request(anyhow!("Account has no email address")))?;

        let token = create_verification_token(&self.jwt, user.id, email)?;
        let code = generate_code();

        let token_hash = hash_password(&token, self.app.bcrypt_cost)?;
        let code_hash = hash_password(&code, self.app.bcrypt_cost)?;

        sqlx::query(
            "UPDATE users
             SET email_token = $2,
                 code = $3,
                 code_expire_at = now() + make_interval(secs => $4),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&token_hash)
        .bind(&code_hash)
        .bind(self.jwt.verification_token_expiry as f64)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;

        let verify_link = format!(
            "{}/#/auth/verify-email?token={}",
            self.app.client_base_url, token
        );
        self.email
            .send_verification_email(email, &super::service::display_name(user), &verify_link, &code)
            .await
    }

    /// Confirms via the emailed link.
    #[instrument(skip(self, token))]
    pub async fn confirm_by_token(&self, token: &str) -> Result<(), AppError> {
        let invalid = || AppError::bad_request(anyhow!("Email verification failed"));

        let claims = verify_verification_token(&self.jwt, token).map_err(|_| invalid())?;
        let user = self.load_user(claims.id).await?.ok_or_else(invalid)?;

        if user.email.as_deref() != Some(claims.email.as_str()) {
            return Err(invalid());
        }

        let stored = user.email_token.as_deref().ok_or_else(invalid)?;
        if !verify_password(token, stored)? {
            return Err(invalid());
        }

        self.mark_email_verified(user.id).await
    }

    /// Confirms via the emailed short code.
    #[instrument(skip(self, code))]
    pub async fn confirm_by_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        let invalid = || AppError::bad_request(anyhow!("Email verification failed"));

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE email = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(invalid)?;

        let expires = user.code_expire_at.ok_or_else(invalid)?;
        if expires < chrono::Utc::now() {
            return Err(invalid());
        }

        let stored = user.code.as_deref().ok_or_else(invalid)?;
        if !verify_password(code, stored)? {
            return Err(invalid());
        }

        self.mark_email_verified(user.id).await
    }

    /// Re-sends the verification mail for an unverified account.
    #[instrument(skip(self))]
    pub async fn resend(&self, user: &User) -> Result<(), AppError> {
        if user.is_email_verified() {
            return Err(AppError::bad_request(anyhow!("Email is already verified")));
        }
        self.send_email_verification(user).await
    }

    async fn load_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users
             SET email_verified_at = now(),
                 email_token = NULL,
                 code = NULL,
                 code_expire_at = NULL,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(AppError::database)?;
        Ok(())
    }
}

fn generate_code() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    bytes
        .iter()
        .take(CODE_LENGTH)
        .map(|b| char::from_digit((*b % 10) as u32, 10).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
