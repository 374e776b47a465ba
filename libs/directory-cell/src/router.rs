// libs/directory-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::actor_middleware;

use crate::handlers;

pub fn directory_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/patients",
            get(handlers::get_patients).post(handlers::create_patient),
        )
        .route(
            "/patients/{patient_id}",
            get(handlers::get_patient).delete(handlers::delete_patient),
        )
        .route(
            "/staff",
            get(handlers::get_staff_accounts).post(handlers::create_staff_account),
        )
        .route(
            "/staff/{account_id}",
            get(handlers::get_staff_account).delete(handlers::delete_staff_account),
        )
        .route("/practitioners", get(handlers::get_practitioners))
        .route(
            "/practitioners/{practitioner_id}",
            get(handlers::get_practitioner).delete(handlers::delete_practitioner),
        )
        .route("/front-desk", get(handlers::get_front_desk_profiles))
        .route(
            "/front-desk/{front_desk_id}",
            get(handlers::get_front_desk_profile).delete(handlers::delete_front_desk_profile),
        )
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
