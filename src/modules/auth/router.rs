use axum::{Router, middleware, routing::{get, post}};

use crate::middleware::auth::require_auth;
use crate::state::AppState;

use super::controller::{
    authenticated, has_permissions, has_role, login, logout, refresh_token, register,
    request_password, resend_verification, reset_password, verify_email, verify_email_code,
};

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    // Everything in `guarded` runs behind the auth middleware; the rest is
    // the public surface.
    let guarded = Router::new()
        .route("/logout", get(logout))
        .route("/role", get(has_role))
        .route("/permissions", get(has_permissions))
        .route("/email/resend", post(resend_verification))
        .layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/request-password", post(request_password))
        .route("/reset-password", post(reset_password))
        .route("/authenticated", get(authenticated))
        .route("/email/verify", post(verify_email))
        .route("/email/verify-code", post(verify_email_code))
        .merge(guarded)
}
