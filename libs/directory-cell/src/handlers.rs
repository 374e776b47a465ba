// libs/directory-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Actor, RequestMeta};
use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, CreateStaffRequest, DirectoryError};
use crate::services::patients::PatientService;
use crate::services::profiles::{FrontDeskService, PractitionerService};
use crate::services::staff::StaffService;

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patients(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(state.pool.clone())
        .list()
        .await
        .map_err(directory_error)?;

    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(state.pool.clone())
        .get(patient_id)
        .await
        .map_err(directory_error)?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(state.pool.clone())
        .create(request, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient,
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    PatientService::new(state.pool.clone())
        .delete(patient_id, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient deleted",
    })))
}

// ==============================================================================
// STAFF ACCOUNT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_staff_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let accounts = StaffService::new(state.pool.clone())
        .list()
        .await
        .map_err(directory_error)?;

    Ok(Json(json!(accounts)))
}

#[axum::debug_handler]
pub async fn get_staff_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let account = StaffService::new(state.pool.clone())
        .get(account_id)
        .await
        .map_err(directory_error)?
        .ok_or_else(|| AppError::NotFound("Staff account not found".to_string()))?;

    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn create_staff_account(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    let account = StaffService::new(state.pool.clone())
        .create(request, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "staff_account": account,
    })))
}

#[axum::debug_handler]
pub async fn delete_staff_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    StaffService::new(state.pool.clone())
        .delete(account_id, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Staff account deleted",
    })))
}

// ==============================================================================
// PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_practitioners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let profiles = PractitionerService::new(state.pool.clone())
        .list()
        .await
        .map_err(directory_error)?;

    Ok(Json(json!(profiles)))
}

#[axum::debug_handler]
pub async fn get_practitioner(
    State(state): State<Arc<AppState>>,
    Path(practitioner_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let profile = PractitionerService::new(state.pool.clone())
        .get(practitioner_id)
        .await
        .map_err(directory_error)?
        .ok_or_else(|| AppError::NotFound("Practitioner not found".to_string()))?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn delete_practitioner(
    State(state): State<Arc<AppState>>,
    Path(practitioner_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    PractitionerService::new(state.pool.clone())
        .delete(practitioner_id, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Practitioner deleted",
    })))
}

#[axum::debug_handler]
pub async fn get_front_desk_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let profiles = FrontDeskService::new(state.pool.clone())
        .list()
        .await
        .map_err(directory_error)?;

    Ok(Json(json!(profiles)))
}

#[axum::debug_handler]
pub async fn get_front_desk_profile(
    State(state): State<Arc<AppState>>,
    Path(front_desk_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let profile = FrontDeskService::new(state.pool.clone())
        .get(front_desk_id)
        .await
        .map_err(directory_error)?
        .ok_or_else(|| AppError::NotFound("Front-desk profile not found".to_string()))?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn delete_front_desk_profile(
    State(state): State<Arc<AppState>>,
    Path(front_desk_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<Json<Value>, AppError> {
    FrontDeskService::new(state.pool.clone())
        .delete(front_desk_id, &actor, &meta)
        .await
        .map_err(directory_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Front-desk profile deleted",
    })))
}

fn directory_error(e: DirectoryError) -> AppError {
    match e {
        DirectoryError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        DirectoryError::AlreadyExists(what) => AppError::Conflict(format!("{} already exists", what)),
        DirectoryError::Validation(msg) => AppError::BadRequest(msg),
        DirectoryError::Database(msg) => AppError::Database(msg),
    }
}
