pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::session::handlers as sessions;
use crate::state::AppState;
use crate::storage::handlers as resumes;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Editing sessions
        .route("/api/v1/sessions", post(sessions::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/fields",
            patch(sessions::handle_update_field),
        )
        .route(
            "/api/v1/sessions/:id/entries",
            post(sessions::handle_add_entry),
        )
        .route(
            "/api/v1/sessions/:id/entries/:section/:index",
            delete(sessions::handle_remove_entry),
        )
        .route("/api/v1/sessions/:id/reset", post(sessions::handle_reset))
        .route("/api/v1/sessions/:id/import", post(sessions::handle_import))
        .route("/api/v1/sessions/:id/layout", get(sessions::handle_get_layout))
        .route("/api/v1/sessions/:id/export", get(sessions::handle_export))
        .route("/api/v1/sessions/:id/save", put(sessions::handle_save))
        // Stored records
        .route(
            "/api/v1/resumes/:user_id",
            get(resumes::handle_get_resume)
                .put(resumes::handle_put_resume)
                .delete(resumes::handle_delete_resume),
        )
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
