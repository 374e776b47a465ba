// libs/directory-cell/tests/snapshot_capture_test.rs
//
// The delete flows capture rows into audit snapshots; a snapshot built from a
// row must decode back into something restoration accepts.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use audit_cell::snapshot::{DeletionSnapshot, StaffDeletionDetails};
use directory_cell::models::{PractitionerProfile, StaffAccount};
use shared_models::auth::StaffRole;

fn practitioner_row(name: &str) -> PractitionerProfile {
    PractitionerProfile {
        id: Uuid::new_v4(),
        name: name.to_string(),
        specialty: "Endodontics".to_string(),
        email: Some(format!("{}@clinic.example", name.to_lowercase())),
        phone: None,
        is_deleted: false,
        deleted_at: None,
        deleted_by: None,
        created_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
    }
}

fn staff_row(name: &str, role: StaffRole, profile_id: Option<Uuid>) -> StaffAccount {
    StaffAccount {
        id: Uuid::new_v4(),
        username: name.to_lowercase().replace(' ', "."),
        name: name.to_string(),
        role,
        profile_id,
        is_deleted: false,
        deleted_at: None,
        deleted_by: None,
        created_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
    }
}

#[test]
fn captured_staff_delete_decodes_for_restoration() {
    let profile = practitioner_row("Marta");
    let account = staff_row("Marta", StaffRole::Practitioner, Some(profile.id));

    let details = DeletionSnapshot::StaffAccount(StaffDeletionDetails {
        deleted_user: (&account).into(),
        practitioner_data: Some((&profile).into()),
        front_desk_data: None,
    })
    .to_details();

    // Exactly what the restore endpoint will read back from the entry
    let parsed = DeletionSnapshot::from_details("staff_accounts", &details).unwrap();
    assert_eq!(parsed.primary_id(), account.id);
    assert_eq!(parsed.primary_name(), "Marta");

    match parsed {
        DeletionSnapshot::StaffAccount(d) => {
            assert_eq!(d.deleted_user.profile_id, Some(profile.id));
            let dependent = d.practitioner_data.expect("profile snapshot travels along");
            assert_eq!(dependent.id, profile.id);
            assert_eq!(dependent.specialty, "Endodontics");
        }
        other => panic!("unexpected snapshot variant: {:?}", other),
    }
}

#[test]
fn admin_delete_needs_no_dependent_capture() {
    let account = staff_row("Root Admin", StaffRole::Admin, None);

    let details = DeletionSnapshot::StaffAccount(StaffDeletionDetails {
        deleted_user: (&account).into(),
        practitioner_data: None,
        front_desk_data: None,
    })
    .to_details();

    assert!(DeletionSnapshot::from_details("staff_accounts", &details).is_ok());
}
