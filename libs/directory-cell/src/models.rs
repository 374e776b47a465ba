// libs/directory-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use audit_cell::snapshot::{
    FrontDeskSnapshot, PatientSnapshot, PractitionerSnapshot, StaffSnapshot,
};
use shared_models::auth::StaffRole;

// ==============================================================================
// PEOPLE RECORDS
// ==============================================================================
//
// All four record types are soft-deletable: a deleted row disappears from
// every normal read but keeps its id so the audit trail can bring it back.

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StaffAccount {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: StaffRole,
    /// Link to the dependent professional profile for practitioner and
    /// front-desk roles. Legacy rows may still carry NULL here and are
    /// matched by display name instead.
    pub profile_id: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PractitionerProfile {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FrontDeskProfile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shift: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Snapshot conversions: what the delete flows hand to the audit trail.

impl From<&Patient> for PatientSnapshot {
    fn from(p: &Patient) -> Self {
        PatientSnapshot {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            birth_date: p.birth_date,
            notes: p.notes.clone(),
            created_at: p.created_at,
        }
    }
}

impl From<&StaffAccount> for StaffSnapshot {
    fn from(a: &StaffAccount) -> Self {
        StaffSnapshot {
            id: a.id,
            username: a.username.clone(),
            name: a.name.clone(),
            role: a.role,
            profile_id: a.profile_id,
            created_at: a.created_at,
        }
    }
}

impl From<&PractitionerProfile> for PractitionerSnapshot {
    fn from(p: &PractitionerProfile) -> Self {
        PractitionerSnapshot {
            id: p.id,
            name: p.name.clone(),
            specialty: p.specialty.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            created_at: p.created_at,
        }
    }
}

impl From<&FrontDeskProfile> for FrontDeskSnapshot {
    fn from(p: &FrontDeskProfile) -> Self {
        FrontDeskSnapshot {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            shift: p.shift.clone(),
            created_at: p.created_at,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStaffRequest {
    pub username: String,
    pub name: String,
    pub role: StaffRole,
    // Profile fields, used when the role implies a dependent profile
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shift: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DirectoryError {
    pub fn from_db(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DirectoryError::AlreadyExists("A record with this key".to_string());
            }
        }
        DirectoryError::Database(e.to_string())
    }
}
