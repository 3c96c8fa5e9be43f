use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::modules::users::model::User;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{extract_bearer_token, verify_access_token};

/// The authenticated user, inserted into request extensions by
/// [`require_auth`] and read back out by [`crate::context::RequestContext`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware. Verifies the bearer access token, loads the
/// user row it points at and stores it in request extensions. Routes mounted
/// without this layer are the public surface.
///
/// ```rust,ignore
/// let guarded = Router::new()
///     .route("/me", get(me_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    let claims = verify_access_token(&state.jwt_config, token)?;

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(claims.id)
    .fetch_optional(&state.db)
    .await
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    if !user.is_active || user.is_archived {
        return Err(AppError::unauthorized("Account is not active"));
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
