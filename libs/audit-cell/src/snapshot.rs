// libs/audit-cell/src/snapshot.rs
//
// Typed deletion snapshots. A DELETE audit entry's `details` column is not a
// free-form blob: each tracked entity kind has a fixed payload shape carrying
// exactly the fields needed to reconstruct the row (and any dependent row).
// Parsing is strict - a payload that cannot be decoded for its entity type is
// rejected, never guess-filled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::StaffRole;

use crate::models::EntityKind;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot cannot be decoded for {entity_type}: {reason}")]
    Undecodable { entity_type: String, reason: String },

    #[error("snapshot missing required data: {0}")]
    Missing(String),

    #[error("no restoration support for entity type: {0}")]
    UnsupportedEntity(String),
}

// ==============================================================================
// PER-ENTITY SNAPSHOTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffSnapshot {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: StaffRole,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontDeskSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shift: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// TAGGED DELETION PAYLOADS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDeletionDetails {
    pub deleted_patient: PatientSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDeletionDetails {
    pub deleted_user: StaffSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practitioner_data: Option<PractitionerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_desk_data: Option<FrontDeskSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerDeletionDetails {
    pub deleted_practitioner: PractitionerSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontDeskDeletionDetails {
    pub deleted_front_desk: FrontDeskSnapshot,
}

/// The union of all deletion payloads, keyed by the audit entry's
/// `entity_type`. Restoration switches on the variant to know which rows to
/// bring back.
#[derive(Debug, Clone)]
pub enum DeletionSnapshot {
    Patient(PatientDeletionDetails),
    StaffAccount(StaffDeletionDetails),
    Practitioner(PractitionerDeletionDetails),
    FrontDesk(FrontDeskDeletionDetails),
}

impl DeletionSnapshot {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            DeletionSnapshot::Patient(_) => EntityKind::Patients,
            DeletionSnapshot::StaffAccount(_) => EntityKind::StaffAccounts,
            DeletionSnapshot::Practitioner(_) => EntityKind::PractitionerProfiles,
            DeletionSnapshot::FrontDesk(_) => EntityKind::FrontDeskProfiles,
        }
    }

    pub fn primary_id(&self) -> Uuid {
        match self {
            DeletionSnapshot::Patient(d) => d.deleted_patient.id,
            DeletionSnapshot::StaffAccount(d) => d.deleted_user.id,
            DeletionSnapshot::Practitioner(d) => d.deleted_practitioner.id,
            DeletionSnapshot::FrontDesk(d) => d.deleted_front_desk.id,
        }
    }

    pub fn primary_name(&self) -> &str {
        match self {
            DeletionSnapshot::Patient(d) => &d.deleted_patient.name,
            DeletionSnapshot::StaffAccount(d) => &d.deleted_user.name,
            DeletionSnapshot::Practitioner(d) => &d.deleted_practitioner.name,
            DeletionSnapshot::FrontDesk(d) => &d.deleted_front_desk.name,
        }
    }

    /// Decode the `details` payload of a DELETE entry for the given entity
    /// type, validating that everything restoration will need is present.
    pub fn from_details(entity_type: &str, details: &Value) -> Result<Self, SnapshotError> {
        let kind = EntityKind::parse(entity_type)
            .ok_or_else(|| SnapshotError::UnsupportedEntity(entity_type.to_string()))?;

        let undecodable = |e: serde_json::Error| SnapshotError::Undecodable {
            entity_type: entity_type.to_string(),
            reason: e.to_string(),
        };

        let snapshot = match kind {
            EntityKind::Patients => {
                DeletionSnapshot::Patient(serde_json::from_value(details.clone()).map_err(undecodable)?)
            }
            EntityKind::StaffAccounts => {
                DeletionSnapshot::StaffAccount(serde_json::from_value(details.clone()).map_err(undecodable)?)
            }
            EntityKind::PractitionerProfiles => {
                DeletionSnapshot::Practitioner(serde_json::from_value(details.clone()).map_err(undecodable)?)
            }
            EntityKind::FrontDeskProfiles => {
                DeletionSnapshot::FrontDesk(serde_json::from_value(details.clone()).map_err(undecodable)?)
            }
            EntityKind::Appointments | EntityKind::WorkingWindows => {
                return Err(SnapshotError::UnsupportedEntity(entity_type.to_string()));
            }
        };

        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_details(&self) -> Value {
        match self {
            DeletionSnapshot::Patient(d) => serde_json::to_value(d),
            DeletionSnapshot::StaffAccount(d) => serde_json::to_value(d),
            DeletionSnapshot::Practitioner(d) => serde_json::to_value(d),
            DeletionSnapshot::FrontDesk(d) => serde_json::to_value(d),
        }
        .expect("deletion snapshots are plain data and always serialize")
    }

    /// A staff account whose role implies a dependent profile must carry that
    /// profile's snapshot; without it the account cannot be fully restored.
    fn validate(&self) -> Result<(), SnapshotError> {
        if let DeletionSnapshot::StaffAccount(details) = self {
            match details.deleted_user.role {
                StaffRole::Practitioner if details.practitioner_data.is_none() => {
                    return Err(SnapshotError::Missing(
                        "practitioner_data for a practitioner staff account".to_string(),
                    ));
                }
                StaffRole::FrontDesk if details.front_desk_data.is_none() => {
                    return Err(SnapshotError::Missing(
                        "front_desk_data for a front-desk staff account".to_string(),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn staff_details(role: &str) -> Value {
        json!({
            "deleted_user": {
                "id": "7f1f4a2e-54ab-44c8-9f3a-2b8f0a3f6f10",
                "username": "dra.lima",
                "name": "Dra. Lima",
                "role": role,
                "profile_id": "0d4a7a9e-30cc-4f8e-9a1d-5a3bb1a0f001",
                "created_at": "2025-03-01T12:00:00Z"
            },
            "practitioner_data": {
                "id": "0d4a7a9e-30cc-4f8e-9a1d-5a3bb1a0f001",
                "name": "Dra. Lima",
                "specialty": "Orthodontics",
                "email": "lima@clinic.example",
                "phone": null,
                "created_at": "2025-03-01T12:00:00Z"
            }
        })
    }

    #[test]
    fn staff_snapshot_round_trips() {
        let details = staff_details("practitioner");
        let snapshot = DeletionSnapshot::from_details("staff_accounts", &details).unwrap();

        assert_eq!(snapshot.entity_kind(), EntityKind::StaffAccounts);
        assert_eq!(snapshot.primary_name(), "Dra. Lima");
        assert_eq!(snapshot.to_details(), details);
    }

    #[test]
    fn practitioner_role_requires_dependent_data() {
        let mut details = staff_details("practitioner");
        details.as_object_mut().unwrap().remove("practitioner_data");

        let err = DeletionSnapshot::from_details("staff_accounts", &details).unwrap_err();
        assert_matches!(err, SnapshotError::Missing(_));
    }

    #[test]
    fn admin_role_needs_no_dependent_data() {
        let mut details = staff_details("admin");
        details.as_object_mut().unwrap().remove("practitioner_data");

        let snapshot = DeletionSnapshot::from_details("staff_accounts", &details).unwrap();
        assert_matches!(snapshot, DeletionSnapshot::StaffAccount(_));
    }

    #[test]
    fn incomplete_payload_is_rejected() {
        let err =
            DeletionSnapshot::from_details("patients", &json!({ "id": "not-a-snapshot" })).unwrap_err();
        assert_matches!(err, SnapshotError::Undecodable { .. });
    }

    #[test]
    fn unsupported_entity_is_rejected() {
        let err = DeletionSnapshot::from_details("appointments", &json!({})).unwrap_err();
        assert_matches!(err, SnapshotError::UnsupportedEntity(_));

        let err = DeletionSnapshot::from_details("finances", &json!({})).unwrap_err();
        assert_matches!(err, SnapshotError::UnsupportedEntity(_));
    }
}
