// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::actor_middleware;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Availability
        .route(
            "/practitioners/{practitioner_id}/available-slots",
            get(handlers::get_available_slots),
        )
        .route(
            "/available-slots/weekly",
            get(handlers::get_weekly_available_slots),
        )
        // Appointments
        .route("/appointments", post(handlers::book_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        // Working windows
        .route(
            "/practitioners/{practitioner_id}/working-windows",
            get(handlers::get_practitioner_windows).post(handlers::create_practitioner_window),
        )
        .route(
            "/working-windows/{window_id}",
            put(handlers::update_window).delete(handlers::delete_window),
        )
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
