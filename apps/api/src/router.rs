use std::sync::Arc;

use axum::{routing::get, Router};

use audit_cell::router::audit_routes;
use directory_cell::router::directory_routes;
use scheduling_cell::router::scheduling_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Operations API is running!" }))
        .nest("/audit", audit_routes(state.clone()))
        .merge(scheduling_routes(state.clone()))
        .merge(directory_routes(state))
}
