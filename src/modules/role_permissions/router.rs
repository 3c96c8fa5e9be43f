use axum::{
    Router, middleware,
    routing::get,
};

use crate::middleware::auth::require_auth;
use crate::state::AppState;

use super::controller::{
    create_role_permission, delete_role_permission, get_role_permission_by_id,
    get_role_permissions, list_permission_catalog, update_role_permission,
};

pub fn init_role_permissions_router(state: AppState) -> Router<AppState> {
    // Reads are open to any authenticated caller (scoped in the handlers);
    // mutations check the management permission themselves since the same
    // paths mix open and managed methods.
    Router::new()
        .route("/", get(get_role_permissions).post(create_role_permission))
        .route("/catalog", get(list_permission_catalog))
        .route(
            "/{id}",
            get(get_role_permission_by_id)
                .put(update_role_permission)
                .delete(delete_role_permission),
        )
        .layer(middleware::from_fn_with_state(state, require_auth))
}
