//! Permission-based route guards.
//!
//! A guarded router nest declares the permissions that open it; a request
//! passes when the caller's role holds ANY of them (enabled rows only, read
//! fresh from the database rather than trusted from the token snapshot).
//! Handlers with mixed per-route rules call [`ensure_any_permission`]
//! directly instead of going through a nest-level layer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::CurrentUser;
use crate::modules::role_permissions::model::Permission;
use crate::modules::role_permissions::service::RolePermissionService;
use crate::modules::users::model::User;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Database-backed permission check shared by the guard middleware and by
/// handlers with per-route rules.
pub async fn ensure_any_permission(
    state: &AppState,
    user: &User,
    required: &[Permission],
) -> Result<(), AppError> {
    if required.is_empty() {
        return Ok(());
    }

    let role_id = user
        .role_id
        .ok_or_else(|| AppError::forbidden("No role assigned"))?;

    let allowed = RolePermissionService::new(state.db.clone())
        .role_has_any(role_id, required)
        .await?;

    if !allowed {
        tracing::warn!(
            user_id = %user.id,
            required = ?required,
            "Permission check failed"
        );
        return Err(AppError::forbidden("Insufficient permissions"));
    }

    Ok(())
}

/// Checks that the authenticated user's role holds at least one of
/// `required`. Runs after [`crate::middleware::auth::require_auth`], which
/// put the user into request extensions.
///
/// ```rust,ignore
/// let roles = Router::new()
///     .route("/", get(list_roles))
///     .layer(middleware::from_fn_with_state(state.clone(), require_role_management));
/// ```
pub async fn check_permissions(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    required: &'static [Permission],
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.0.clone())
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    ensure_any_permission(&state, &user, required).await?;

    Ok(next.run(req).await)
}

/// Guard for role and role-permission management endpoints.
pub async fn require_role_management(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match check_permissions(
        State(state),
        req,
        next,
        &[Permission::ChangeRolesPermissions],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Guard for email template administration.
pub async fn require_admin_edit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match check_permissions(State(state), req, next, &[Permission::AdminEdit]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
