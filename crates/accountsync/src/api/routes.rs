//! API routes for the synchronizer

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::handlers::*;

/// Create the synchronizer router
pub fn create_router(state: Arc<SyncApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/users/:user_id/accounts",
            post(create_account).get(list_accounts),
        )
        .route(
            "/api/v1/users/:user_id/accounts/:account_id",
            get(get_account).delete(delete_account),
        )
        .route(
            "/api/v1/users/:user_id/accounts/:account_id/filter",
            put(set_filter),
        )
        .route(
            "/api/v1/users/:user_id/accounts/:account_id/auto",
            post(toggle_auto),
        )
        .route(
            "/api/v1/users/:user_id/accounts/:account_id/active",
            post(toggle_active),
        )
        .route("/api/v1/callbacks", post(handle_callback))
        .route("/api/v1/orders/take", post(take_order))
        .route("/api/v1/users/:user_id/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
