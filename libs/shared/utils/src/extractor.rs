use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::auth::{Actor, RequestMeta, StaffRole};
use shared_models::error::AppError;

/// Middleware attaching the resolved actor context to the request.
///
/// Authentication and the permission matrix live upstream; by the time a
/// request reaches this service the gateway has already resolved the session
/// into `x-actor-id`, `x-actor-name` and `x-actor-role` headers. Requests
/// without a complete context are rejected.
pub async fn actor_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();

    let actor_id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing actor context".to_string()))?;

    let actor_id = Uuid::parse_str(actor_id)
        .map_err(|_| AppError::Auth("Malformed actor id".to_string()))?;

    let actor_name = headers
        .get("x-actor-name")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing actor context".to_string()))?
        .to_string();

    let role: StaffRole = headers
        .get("x-actor-role")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing actor context".to_string()))?
        .parse()
        .map_err(|_| AppError::Auth("Unknown actor role".to_string()))?;

    let meta = RequestMeta {
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string()),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let actor = Actor {
        id: actor_id,
        name: actor_name,
        role,
    };

    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(meta);

    Ok(next.run(request).await)
}
