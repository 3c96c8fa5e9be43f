use anyhow::anyhow;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::context::RequestContext;
use crate::modules::users::model::{LoginDto, RegisterUserDto};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::email_verification::EmailVerificationService;
use super::model::{
    AuthResponse, ChangePasswordRequestDto, HasPermissionsQuery, HasRoleQuery, RefreshTokenDto,
    ResetPasswordRequestDto, VerifyEmailCodeDto, VerifyEmailTokenDto,
};
use super::service::AuthService;

fn verification_service(state: &AppState) -> EmailVerificationService {
    EmailVerificationService::new(
        state.db.clone(),
        state.jwt_config.clone(),
        state.app_config.clone(),
        EmailService::new(state.email_config.clone()),
    )
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = AuthService::from_state(&state).register(dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginDto>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = AuthService::from_state(&state)
        .login(&dto.email, &dto.password)
        .await?;
    Ok(Json(response))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenDto>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = AuthService::from_state(&state)
        .refresh_token(&dto.refresh_token)
        .await?;
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Value>, AppError> {
    let user = ctx.require_user()?;
    AuthService::from_state(&state).logout(user.id).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn authenticated(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Value>, AppError> {
    let authenticated = match ctx.token() {
        Some(token) => AuthService::from_state(&state).authenticated(token).await?,
        None => false,
    };
    Ok(Json(json!({ "authenticated": authenticated })))
}

/// Role introspection: does the caller's role match any of the given names?
pub async fn has_role(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HasRoleQuery>,
) -> Result<Json<Value>, AppError> {
    let user = ctx.require_user()?;
    let has_role = AuthService::from_state(&state)
        .has_role(user, &query.names())
        .await?;
    Ok(Json(json!({ "has_role": has_role })))
}

/// Permission introspection against the token snapshot. Unlike the route
/// guards this requires ALL listed permissions; an empty list is rejected
/// rather than answering vacuously true.
pub async fn has_permissions(
    ctx: RequestContext,
    Query(query): Query<HasPermissionsQuery>,
) -> Result<Json<Value>, AppError> {
    ctx.require_user()?;
    let names = required_permission_names(&query)?;
    let required: Vec<&str> = names.iter().map(String::as_str).collect();
    Ok(Json(json!({ "has_permissions": ctx.has_permissions(&required) })))
}

fn required_permission_names(query: &HasPermissionsQuery) -> Result<Vec<String>, AppError> {
    let names = query.names();
    if names.is_empty() {
        return Err(AppError::bad_request(anyhow!(
            "At least one permission must be given"
        )));
    }
    Ok(names)
}

pub async fn request_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequestDto>,
) -> Result<Json<Value>, AppError> {
    AuthService::from_state(&state)
        .request_password(&dto.email)
        .await?;
    Ok(Json(json!({ "message": "Reset link sent" })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequestDto>,
) -> Result<Json<Value>, AppError> {
    AuthService::from_state(&state).reset_password(dto).await?;
    Ok(Json(json!({ "message": "Password has been reset" })))
}

pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyEmailTokenDto>,
) -> Result<Json<Value>, AppError> {
    verification_service(&state).confirm_by_token(&dto.token).await?;
    Ok(Json(json!({ "message": "Email verified" })))
}

pub async fn verify_email_code(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyEmailCodeDto>,
) -> Result<Json<Value>, AppError> {
    verification_service(&state)
        .confirm_by_code(&dto.email, &dto.code)
        .await?;
    Ok(Json(json!({ "message": "Email verified" })))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Value>, AppError> {
    let user = ctx.require_user()?;
    verification_service(&state).resend(user).await?;
    Ok(Json(json!({ "message": "Verification email sent" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_permission_query_is_rejected() {
        let query = HasPermissionsQuery {
            permissions: " , ,".to_string(),
        };
        let err = required_permission_names(&query).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_permission_query_names_pass_through() {
        let query = HasPermissionsQuery {
            permissions: "USERS_VIEW,USERS_EDIT".to_string(),
        };
        assert_eq!(
            required_permission_names(&query).unwrap(),
            vec!["USERS_VIEW", "USERS_EDIT"]
        );
    }
}
