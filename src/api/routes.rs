use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/extras", get(handlers::list_extras))
        // Comparison (new batch)
        .route(
            "/extras/:extra_id/comparison/send",
            post(handlers::comparison_send),
        )
        .route(
            "/extras/:extra_id/comparison/check",
            post(handlers::comparison_check),
        )
        .route(
            "/extras/:extra_id/comparison/row",
            post(handlers::comparison_selection_row),
        )
        // Preflight
        .route(
            "/extras/:extra_id/preflight/send",
            post(handlers::preflight_send),
        )
        .route(
            "/extras/:extra_id/preflight/check",
            post(handlers::preflight_check),
        )
        .route(
            "/extras/:extra_id/preflight/display",
            post(handlers::preflight_display),
        )
        // Transfer
        .route(
            "/extras/:extra_id/transfer/send",
            post(handlers::transfer_send),
        )
        .route(
            "/extras/:extra_id/transfer/receive",
            post(handlers::transfer_receive),
        )
}
