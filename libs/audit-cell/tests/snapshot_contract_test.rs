// libs/audit-cell/tests/snapshot_contract_test.rs
//
// Contract tests for the deletion payload layout: what the delete flows write
// into `details` is exactly what restoration later expects to read back.

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::snapshot::{
    DeletionSnapshot, FrontDeskDeletionDetails, FrontDeskSnapshot, PatientDeletionDetails,
    PatientSnapshot, SnapshotError, StaffDeletionDetails, StaffSnapshot,
};
use shared_models::auth::{Actor, RequestMeta, StaffRole};

fn patient_snapshot() -> PatientSnapshot {
    PatientSnapshot {
        id: Uuid::new_v4(),
        name: "Ana Souza".to_string(),
        email: Some("ana@example.com".to_string()),
        phone: None,
        birth_date: None,
        notes: Some("prefers morning visits".to_string()),
        created_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
    }
}

#[test]
fn patient_payload_round_trips_through_details() {
    let snapshot = DeletionSnapshot::Patient(PatientDeletionDetails {
        deleted_patient: patient_snapshot(),
    });

    let details = snapshot.to_details();
    assert!(details.get("deleted_patient").is_some());

    let parsed = DeletionSnapshot::from_details("patients", &details).unwrap();
    assert_eq!(parsed.primary_id(), snapshot.primary_id());
    assert_eq!(parsed.primary_name(), "Ana Souza");
    assert_eq!(parsed.entity_kind(), EntityKind::Patients);
}

#[test]
fn front_desk_staff_payload_requires_its_profile() {
    let account_id = Uuid::new_v4();
    let profile_id = Uuid::new_v4();

    let complete = DeletionSnapshot::StaffAccount(StaffDeletionDetails {
        deleted_user: StaffSnapshot {
            id: account_id,
            username: "clara.front".to_string(),
            name: "Clara".to_string(),
            role: StaffRole::FrontDesk,
            profile_id: Some(profile_id),
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
        },
        practitioner_data: None,
        front_desk_data: Some(FrontDeskSnapshot {
            id: profile_id,
            name: "Clara".to_string(),
            email: Some("clara@clinic.example".to_string()),
            phone: None,
            shift: "morning".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
        }),
    });

    let details = complete.to_details();
    assert!(details.get("front_desk_data").is_some());
    assert!(details.get("practitioner_data").is_none());
    assert!(DeletionSnapshot::from_details("staff_accounts", &details).is_ok());

    // Strip the dependent profile: the payload can no longer support a restore
    let mut stripped = details.clone();
    stripped.as_object_mut().unwrap().remove("front_desk_data");
    assert!(matches!(
        DeletionSnapshot::from_details("staff_accounts", &stripped),
        Err(SnapshotError::Missing(_))
    ));
}

#[test]
fn front_desk_profile_payload_round_trips() {
    let snapshot = DeletionSnapshot::FrontDesk(FrontDeskDeletionDetails {
        deleted_front_desk: FrontDeskSnapshot {
            id: Uuid::new_v4(),
            name: "Rui".to_string(),
            email: None,
            phone: Some("+351 900 000 000".to_string()),
            shift: "full".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 11, 20, 14, 30, 0).unwrap(),
        },
    });

    let parsed =
        DeletionSnapshot::from_details("front_desk_profiles", &snapshot.to_details()).unwrap();
    assert_eq!(parsed.entity_kind(), EntityKind::FrontDeskProfiles);
    assert_eq!(parsed.primary_name(), "Rui");
}

#[test]
fn entry_builder_carries_actor_and_request_context() {
    let actor = Actor {
        id: Uuid::new_v4(),
        name: "Dr. Admin".to_string(),
        role: StaffRole::Admin,
    };
    let meta = RequestMeta {
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("clinic-web/1.4".to_string()),
    };
    let entity_id = Uuid::new_v4();

    let entry = NewAuditEntry::new(&actor, AuditAction::Delete, EntityKind::Patients)
        .entity(entity_id, "Ana Souza")
        .details(json!({ "deleted_patient": {} }))
        .meta(&meta);

    assert_eq!(entry.actor_id, actor.id);
    assert_eq!(entry.actor_name, "Dr. Admin");
    assert_eq!(entry.action, AuditAction::Delete);
    assert_eq!(entry.entity_type, "patients");
    assert_eq!(entry.entity_id, Some(entity_id));
    assert_eq!(entry.entity_name.as_deref(), Some("Ana Souza"));
    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(entry.user_agent.as_deref(), Some("clinic-web/1.4"));
}
