use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::auth::require_auth;
use crate::middleware::permission::require_admin_edit;
use crate::state::AppState;

use super::controller::{
    create_email_template, delete_email_template, get_email_template_by_id, get_email_templates,
    preview_email_template, render_preview, send_email_template, update_email_template,
};

pub fn init_email_templates_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_email_template).get(get_email_templates))
        .route("/preview", post(render_preview))
        .route(
            "/{id}",
            get(get_email_template_by_id)
                .put(update_email_template)
                .delete(delete_email_template),
        )
        .route("/{id}/preview", post(preview_email_template))
        .route("/{id}/send", post(send_email_template))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_edit,
        ))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
