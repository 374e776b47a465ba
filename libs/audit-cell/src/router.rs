// libs/audit-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::actor_middleware;

use crate::handlers;

pub fn audit_routes(state: Arc<AppState>) -> Router {
    // Reading the trail and restoring from it both require an actor context
    let protected_routes = Router::new()
        .route("/", get(handlers::get_audit_logs))
        .route("/user/{actor_id}", get(handlers::get_actor_audit_logs))
        .route(
            "/entity/{entity_type}/{entity_id}",
            get(handlers::get_entity_audit_logs),
        )
        .route("/date-range", get(handlers::get_audit_logs_by_date_range))
        .route("/restore/{log_id}", post(handlers::restore_entity))
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
