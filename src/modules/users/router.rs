use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::middleware::auth::require_auth;
use crate::state::AppState;

use super::controller::{
    change_password, create_user, delete_user, get_me, get_user_by_id, get_users, update_user,
};

pub fn init_users_router(state: AppState) -> Router<AppState> {
    // The whole nest requires authentication; per-route permission rules
    // (view, manage, self-only) live in the handlers because they differ
    // per method on the same path.
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/me", get(get_me))
        .route(
            "/{id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
        .route("/{id}/password", put(change_password))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
