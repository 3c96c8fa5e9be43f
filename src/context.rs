//! Per-request identity and authorization view.
//!
//! [`RequestContext`] is an extractor that bundles whatever identity the
//! request carries: the loaded user (when the auth middleware ran) and the
//! bearer token itself. Handlers and services ask it questions instead of
//! poking at headers or extensions.
//!
//! Two different permission policies live in this codebase on purpose:
//! route guards pass when ANY required permission is held
//! ([`crate::modules::role_permissions::model::any_enabled_match`]), while
//! [`RequestContext::has_permissions`] answers true only when ALL asked-for
//! permissions appear in the token snapshot. The strict form backs the
//! `/api/auth/permissions` introspection endpoint.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::middleware::auth::CurrentUser;
use crate::modules::auth::model::AccessClaims;
use crate::modules::users::model::User;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{extract_bearer_token, verify_access_token};

#[derive(Debug, Clone)]
pub struct RequestContext {
    user: Option<User>,
    token: Option<String>,
    jwt: JwtConfig,
}

impl RequestContext {
    pub fn new(user: Option<User>, token: Option<String>, jwt: JwtConfig) -> Self {
        Self { user, token, jwt }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }

    pub fn current_user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn current_role_id(&self) -> Option<Uuid> {
        self.user.as_ref().and_then(|u| u.role_id)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Decoded access-token claims, `None` when the token is absent, expired
    /// or signed wrong.
    pub fn claims(&self) -> Option<AccessClaims> {
        let token = self.token.as_deref()?;
        verify_access_token(&self.jwt, token).ok()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.has_permissions(&[permission])
    }

    /// True only when the token snapshot holds EVERY listed permission.
    /// Missing token, missing claim or an empty snapshot all answer false.
    pub fn has_permissions(&self, required: &[&str]) -> bool {
        let Some(claims) = self.claims() else {
            return false;
        };
        let Some(held) = claims.permissions else {
            return false;
        };
        required
            .iter()
            .all(|p| held.iter().any(|h| h.as_str() == *p))
    }

    pub fn require_permissions(&self, required: &[&str]) -> Result<(), AppError> {
        if self.has_permissions(required) {
            Ok(())
        } else {
            Err(AppError::forbidden("Insufficient permissions"))
        }
    }

    /// True when the token's role claim matches any of the given names.
    pub fn has_roles(&self, names: &[&str]) -> bool {
        let Some(claims) = self.claims() else {
            return false;
        };
        match claims.role {
            Some(role) => names.iter().any(|n| *n == role),
            None => false,
        }
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.has_roles(&[name])
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| current.0.clone());
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_string);
        Ok(Self::new(user, token, state.jwt_config.clone()))
    }
}
