use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::auth::require_auth;
use crate::middleware::permission::require_role_management;
use crate::state::AppState;

use super::controller::{create_role, delete_role, get_role_by_id, get_roles, update_role};

pub fn init_roles_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_role).get(get_roles))
        .route(
            "/{id}",
            get(get_role_by_id).put(update_role).delete(delete_role),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_role_management,
        ))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
