// libs/audit-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Actor, RequestMeta};
use shared_models::error::AppError;

use crate::error::{AuditError, RestoreError};
use crate::services::recorder::AuditRecorder;
use crate::services::restoration::RestorationCoordinator;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActorLogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// ==============================================================================
// AUDIT TRAIL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<Value>, AppError> {
    let recorder = AuditRecorder::new(state.pool.clone());

    let logs = recorder
        .list(query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await
        .map_err(audit_error)?;

    Ok(Json(json!(logs)))
}

#[axum::debug_handler]
pub async fn get_actor_audit_logs(
    State(state): State<Arc<AppState>>,
    Path(actor_id): Path<Uuid>,
    Query(query): Query<ActorLogsQuery>,
) -> Result<Json<Value>, AppError> {
    let recorder = AuditRecorder::new(state.pool.clone());

    let logs = recorder
        .list_for_actor(actor_id, query.limit.unwrap_or(50))
        .await
        .map_err(audit_error)?;

    Ok(Json(json!(logs)))
}

#[axum::debug_handler]
pub async fn get_entity_audit_logs(
    State(state): State<Arc<AppState>>,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let recorder = AuditRecorder::new(state.pool.clone());

    let logs = recorder
        .list_for_entity(&entity_type, entity_id)
        .await
        .map_err(audit_error)?;

    Ok(Json(json!(logs)))
}

#[axum::debug_handler]
pub async fn get_audit_logs_by_date_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = match (query.start_date, query.end_date) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(AppError::BadRequest(
                "start_date and end_date are required".to_string(),
            ));
        }
    };

    let recorder = AuditRecorder::new(state.pool.clone());
    let logs = recorder.list_for_range(from, to).await.map_err(audit_error)?;

    Ok(Json(json!(logs)))
}

// ==============================================================================
// RESTORATION HANDLER
// ==============================================================================

#[axum::debug_handler]
pub async fn restore_entity(
    State(state): State<Arc<AppState>>,
    Path(log_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    let coordinator = RestorationCoordinator::new(state.pool.clone());

    let outcome = coordinator
        .restore(log_id, &actor, &meta)
        .await
        .map_err(|e| match e {
            RestoreError::NotFound(msg) => AppError::NotFound(msg),
            RestoreError::InvalidState(msg) => AppError::BadRequest(msg),
            RestoreError::AlreadyRestored(msg) => AppError::Conflict(msg),
            RestoreError::ConstraintViolation(msg) => AppError::Conflict(msg),
            RestoreError::Database(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({
        "success": true,
        "restored": outcome,
    })))
}

fn audit_error(e: AuditError) -> AppError {
    match e {
        AuditError::NotFound => AppError::NotFound("Audit log entry not found".to_string()),
        AuditError::Database(msg) => AppError::Database(msg),
    }
}
