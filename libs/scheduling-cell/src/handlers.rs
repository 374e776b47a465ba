// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Actor, RequestMeta};
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, CreateWorkingWindowRequest, SchedulingError,
    UpdateAppointmentRequest, UpdateWorkingWindowRequest,
};
use crate::services::booking::BookingService;
use crate::services::slots::AvailabilityService;
use crate::services::windows::WorkingWindowService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct WeeklySlotsQuery {
    /// Comma-separated practitioner ids.
    pub practitioner_ids: String,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(practitioner_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let availability = AvailabilityService::new(state.pool.clone());

    let slots = availability
        .get_available_slots(practitioner_id, query.date)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn get_weekly_available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeeklySlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let practitioner_ids = query
        .practitioner_ids
        .split(',')
        .map(|raw| Uuid::parse_str(raw.trim()))
        .collect::<Result<Vec<Uuid>, _>>()
        .map_err(|_| AppError::BadRequest("practitioner_ids must be a comma-separated list of ids".to_string()))?;

    if practitioner_ids.is_empty() {
        return Err(AppError::BadRequest(
            "practitioner_ids must not be empty".to_string(),
        ));
    }

    let availability = AvailabilityService::new(state.pool.clone());
    let today = Utc::now().date_naive();

    let weekly = availability
        .get_weekly_slots(&practitioner_ids, today)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!(weekly)))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = BookingService::new(state.pool.clone());

    let appointment = booking
        .book(request, &actor, &meta)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = BookingService::new(state.pool.clone());

    let appointment = booking
        .get(appointment_id)
        .await
        .map_err(scheduling_error)?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = BookingService::new(state.pool.clone());

    let appointment = booking
        .update(appointment_id, request, &actor, &meta)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

// ==============================================================================
// WORKING WINDOW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_practitioner_windows(
    State(state): State<Arc<AppState>>,
    Path(practitioner_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let windows = WorkingWindowService::new(state.pool.clone());

    let result = windows
        .list_for_practitioner(practitioner_id)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn create_practitioner_window(
    State(state): State<Arc<AppState>>,
    Path(practitioner_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<CreateWorkingWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let windows = WorkingWindowService::new(state.pool.clone());

    let window = windows
        .create(practitioner_id, request, &actor, &meta)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "working_window": window,
    })))
}

#[axum::debug_handler]
pub async fn update_window(
    State(state): State<Arc<AppState>>,
    Path(window_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<UpdateWorkingWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let windows = WorkingWindowService::new(state.pool.clone());

    let window = windows
        .update(window_id, request, &actor, &meta)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "working_window": window,
    })))
}

#[axum::debug_handler]
pub async fn delete_window(
    State(state): State<Arc<AppState>>,
    Path(window_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    let windows = WorkingWindowService::new(state.pool.clone());

    windows
        .delete(window_id, &actor, &meta)
        .await
        .map_err(scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Working window deleted",
    })))
}

fn scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::Conflict => {
            AppError::Conflict("The selected time slot is no longer available".to_string())
        }
        SchedulingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        SchedulingError::Validation(msg) => AppError::BadRequest(msg),
        SchedulingError::Database(msg) => AppError::Database(msg),
    }
}
