//! Login, registration, token refresh and password reset flows.

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::app::AppConfig;
use crate::config::jwt::JwtConfig;
use crate::modules::roles::model::{RoleName, RoleWithPermissions};
use crate::modules::roles::service::RoleService;
use crate::modules::users::model::{RegisterUserDto, User};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::crud::CrudService;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::jwt::{
    create_access_token, create_refresh_token, create_verification_token, verify_access_token,
    verify_refresh_token, verify_verification_token,
};
use crate::utils::password::{hash_password, verify_password};

use super::email_verification::EmailVerificationService;
use super::model::{AuthResponse, ChangePasswordRequestDto};

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt: JwtConfig,
    app: AppConfig,
    email: EmailService,
}

impl AuthService {
    pub fn new(db: PgPool, jwt: JwtConfig, app: AppConfig, email: EmailService) -> Self {
        Self {
            db,
            jwt,
            app,
            email,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.jwt_config.clone(),
            state.app_config.clone(),
            EmailService::new(state.email_config.clone()),
        )
    }

    /// Mints an access/refresh pair for `user` and persists a bcrypt hash of
    /// the refresh token on the user row. The access token carries the role
    /// name and enabled permission names as a snapshot.
    #[instrument(skip(self, user))]
    pub async fn issue_tokens(&self, user: &User) -> Result<(String, String), AppError> {
        let snapshot = match user.role_id {
            Some(role_id) => {
                let roles = RoleService::new(self.db.clone());
                Some(roles.find_with_permissions(role_id).await?)
            }
            None => None,
        };

        let role_name = snapshot.as_ref().map(|s| s.role.name.clone());
        let permissions = snapshot.as_ref().map(RoleWithPermissions::enabled_permission_names);

        let token = create_access_token(&self.jwt, user.id, role_name.clone(), permissions)?;
        let refresh_token =
            create_refresh_token(&self.jwt, user.id, user.email.clone(), role_name)?;

        let refresh_hash = hash_password(&refresh_token, self.app.bcrypt_cost)?;
        UserService::new(self.db.clone())
            .set_refresh_token(user.id, &refresh_hash)
            .await?;

        Ok((token, refresh_token))
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let users = UserService::new(self.db.clone());

        // Every failure path answers the same way.
        let invalid = || AppError::unauthorized("Invalid credentials");

        let user = users
            .find_active_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        let hash = user.hash.as_deref().ok_or_else(invalid)?;
        if !verify_password(password, hash)? {
            return Err(invalid());
        }

        let (token, refresh_token) = self.issue_tokens(&user).await?;
        let user = users.find_with_role(user.id).await?;

        Ok(AuthResponse {
            user,
            token,
            refresh_token,
        })
    }

    #[instrument(skip(self, dto))]
    pub async fn register(&self, dto: RegisterUserDto) -> Result<AuthResponse, AppError> {
        let users = UserService::new(self.db.clone());

        if users
            .find_active_by_email(&dto.user.email)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request(anyhow!(
                "An account with this email already exists"
            )));
        }

        let hash = match &dto.password {
            Some(password) => Some(hash_password(password, self.app.bcrypt_cost)?),
            None => None,
        };

        let default_role_id = RoleService::new(self.db.clone())
            .find_by_name(RoleName::User.as_str())
            .await?
            .map(|role| role.id);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users
                (email, username, first_name, last_name, phone_number, image_url, role_id, hash)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&dto.user.email)
        .bind(&dto.user.username)
        .bind(&dto.user.first_name)
        .bind(&dto.user.last_name)
        .bind(&dto.user.phone_number)
        .bind(&dto.user.image_url)
        .bind(default_role_id)
        .bind(&hash)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::database)?;

        let verification = EmailVerificationService::new(
            self.db.clone(),
            self.jwt.clone(),
            self.app.clone(),
            self.email.clone(),
        );
        let verification_user = user.clone();
        EmailService::send_in_background(async move {
            verification
                .send_email_verification(&verification_user)
                .await
        });

        let email_service = self.email.clone();
        let to = user.email.clone().unwrap_or_default();
        let name = display_name(&user);
        EmailService::send_in_background(async move {
            email_service.send_welcome_email(&to, &name).await
        });

        let (token, refresh_token) = self.issue_tokens(&user).await?;
        let user = users.find_with_role(user.id).await?;

        Ok(AuthResponse {
            user,
            token,
            refresh_token,
        })
    }

    /// Exchanges a valid refresh token for a fresh pair. The presented token
    /// must also match the bcrypt hash stored at issuance, so a rotated-out
    /// or logged-out token is dead even before it expires.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let claims = verify_refresh_token(&self.jwt, refresh_token)?;

        let users = UserService::new(self.db.clone());
        let user = users
            .try_find_one_by_id(claims.id)
            .await?
            .filter(|u| u.is_active && !u.is_archived)
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let stored = user
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;
        if !verify_password(refresh_token, stored)? {
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        let (token, refresh_token) = self.issue_tokens(&user).await?;
        let user = users.find_with_role(user.id).await?;

        Ok(AuthResponse {
            user,
            token,
            refresh_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        UserService::new(self.db.clone())
            .remove_refresh_token(user_id)
            .await
    }

    /// Cheap liveness check for a bearer token: signature valid and the
    /// account behind it still usable.
    #[instrument(skip(self, token))]
    pub async fn authenticated(&self, token: &str) -> Result<bool, AppError> {
        let Ok(claims) = verify_access_token(&self.jwt, token) else {
            return Ok(false);
        };
        let user = UserService::new(self.db.clone())
            .try_find_one_by_id(claims.id)
            .await?;
        Ok(matches!(user, Some(u) if u.is_active && !u.is_archived))
    }

    /// Starts a password reset. Every failure, the unknown-email lookup
    /// included, collapses into the same generic BadRequest.
    #[instrument(skip(self))]
    pub async fn request_password(&self, email: &str) -> Result<(), AppError> {
        let generic = || AppError::bad_request(anyhow!("Forgot password request failed!"));

        let users = UserService::new(self.db.clone());
        let user = require_reset_account(
            users.find_active_by_email(email).await.map_err(|_| generic())?,
        )?;

        let user_email = user.email.clone().ok_or_else(generic)?;
        let token = create_verification_token(&self.jwt, user.id, &user_email)
            .map_err(|_| generic())?;
        let token_hash = hash_password(&token, self.app.bcrypt_cost).map_err(|_| generic())?;

        sqlx::query(
            "INSERT INTO password_resets (user_id, token_hash, expires_at)
             VALUES ($1, $2, now() + make_interval(secs => $3))",
        )
        .bind(user.id)
        .bind(&token_hash)
        .bind(self.app.password_reset_expiry as f64)
        .execute(&self.db)
        .await
        .map_err(|_| generic())?;

        let reset_link = format!(
            "{}/#/auth/reset-password?token={}",
            self.app.client_base_url, token
        );
        let email_service = self.email.clone();
        let name = display_name(&user);
        EmailService::send_in_background(async move {
            email_service
                .send_password_reset_email(&user_email, &name, &reset_link)
                .await
        });

        Ok(())
    }

    /// Completes a password reset. The token must verify, belong to an open
    /// reset request and not be expired; all failures share one message.
    #[instrument(skip(self, dto))]
    pub async fn reset_password(&self, dto: ChangePasswordRequestDto) -> Result<(), AppError> {
        let generic = || AppError::bad_request(anyhow!("Password Reset Failed."));

        let claims = verify_verification_token(&self.jwt, &dto.token).map_err(|_| generic())?;

        let rows = sqlx::query_as::<_, PasswordReset>(
            "SELECT id, token_hash FROM password_resets
             WHERE user_id = $1 AND used_at IS NULL AND expires_at > now()
             ORDER BY created_at DESC",
        )
        .bind(claims.id)
        .fetch_all(&self.db)
        .await
        .map_err(|_| generic())?;

        let mut matched = None;
        for row in &rows {
            if verify_password(&dto.token, &row.token_hash).unwrap_or(false) {
                matched = Some(row.id);
                break;
            }
        }
        let reset_id = matched.ok_or_else(generic)?;

        let users = UserService::new(self.db.clone());
        let user = users
            .try_find_one_by_id(claims.id)
            .await
            .map_err(|_| generic())?
            .ok_or_else(generic)?;

        users
            .change_password(user.id, &dto.password, self.app.bcrypt_cost)
            .await
            .map_err(|_| generic())?;

        sqlx::query("UPDATE password_resets SET used_at = now() WHERE id = $1")
            .bind(reset_id)
            .execute(&self.db)
            .await
            .map_err(|_| generic())?;

        if let Some(to) = user.email.clone() {
            let email_service = self.email.clone();
            let name = display_name(&user);
            EmailService::send_in_background(async move {
                email_service
                    .send_password_reset_confirmation(&to, &name)
                    .await
            });
        }

        Ok(())
    }

    /// True when the user's role name matches any of `names`.
    #[instrument(skip(self))]
    pub async fn has_role(&self, user: &User, names: &[String]) -> Result<bool, AppError> {
        let Some(role_id) = user.role_id else {
            return Ok(false);
        };
        let role = RoleService::new(self.db.clone())
            .try_find_one_by_id(role_id)
            .await?;
        Ok(matches!(role, Some(r) if names.iter().any(|n| *n == r.name)))
    }

}

#[derive(sqlx::FromRow)]
struct PasswordReset {
    id: Uuid,
    token_hash: String,
}

/// Unknown or inactive accounts fail a reset request with the same message
/// as every other sub-step.
fn require_reset_account(user: Option<User>) -> Result<User, AppError> {
    user.ok_or_else(|| AppError::bad_request(anyhow!("Forgot password request failed!")))
}

/// Best name we have for addressing the user in mail.
pub(crate) fn display_name(user: &User) -> String {
    user.first_name
        .clone()
        .or_else(|| user.username.clone())
        .or_else(|| user.email.clone())
        .unwrap_or_else(|| "there".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback_chain() {
        let mut user = crate::modules::users::model::User {
            id: Uuid::new_v4(),
            username: Some("ada".to_string()),
            email: Some("ada@example.com".to_string()),
            phone_number: None,
            first_name: Some("Ada".to_string()),
            last_name: None,
            image_url: None,
            role_id: None,
            is_active: true,
            is_archived: false,
            hash: None,
            refresh_token: None,
            code: None,
            code_expire_at: None,
            email_verified_at: None,
            email_token: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };
        assert_eq!(display_name(&user), "Ada");
        user.first_name = None;
        assert_eq!(display_name(&user), "ada");
        user.username = None;
        assert_eq!(display_name(&user), "ada@example.com");
        user.email = None;
        assert_eq!(display_name(&user), "there");
    }

    #[test]
    fn test_reset_request_rejects_unknown_account() {
        let err = require_reset_account(None).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Forgot password request failed!");
    }
}
