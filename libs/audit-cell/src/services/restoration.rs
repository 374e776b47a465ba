// libs/audit-cell/src/services/restoration.rs
//
// Reversal of soft-deletes recorded in the audit trail. A restore is a single
// transaction: primary entity, any dependent profile, and the RESTORE audit
// entry all commit together or not at all.

use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::auth::{Actor, RequestMeta, StaffRole};

use crate::error::RestoreError;
use crate::models::{AuditAction, AuditLogEntry, NewAuditEntry, RestorationOutcome};
use crate::services::recorder::AuditRecorder;
use crate::snapshot::{
    DeletionSnapshot, FrontDeskSnapshot, PatientSnapshot, PractitionerSnapshot, StaffSnapshot,
};

pub struct RestorationCoordinator {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SoftDeleteProbe {
    is_deleted: bool,
}

impl RestorationCoordinator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reverse the deletion recorded by `log_id`. Single attempt; on any
    /// failure the transaction is rolled back and the error returned as-is -
    /// retrying is the caller's decision.
    pub async fn restore(
        &self,
        log_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<RestorationOutcome, RestoreError> {
        debug!("Restoration requested for audit entry {}", log_id);

        // Lookup
        let entry = sqlx::query_as::<_, AuditLogEntry>("SELECT * FROM audit_logs WHERE id = $1")
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RestoreError::from_db)?
            .ok_or_else(|| RestoreError::NotFound(format!("audit entry {}", log_id)))?;

        if entry.action != AuditAction::Delete {
            return Err(RestoreError::InvalidState(format!(
                "audit entry {} records a {} action, only DELETE entries can be restored",
                log_id, entry.action
            )));
        }

        // Snapshot validation, before any write
        let snapshot = DeletionSnapshot::from_details(&entry.entity_type, &entry.details)?;

        // Transactional restore
        let mut tx = self.pool.begin().await.map_err(RestoreError::from_db)?;

        let dependent_restored = match &snapshot {
            DeletionSnapshot::Patient(details) => {
                restore_patient(&mut *tx, &details.deleted_patient).await?;
                false
            }
            DeletionSnapshot::StaffAccount(details) => {
                restore_staff_account(&mut *tx, &details.deleted_user).await?;
                match details.deleted_user.role {
                    StaffRole::Practitioner => {
                        let data = details
                            .practitioner_data
                            .as_ref()
                            .expect("validated by DeletionSnapshot::from_details");
                        revive_practitioner(&mut *tx, details.deleted_user.profile_id, data).await?
                    }
                    StaffRole::FrontDesk => {
                        let data = details
                            .front_desk_data
                            .as_ref()
                            .expect("validated by DeletionSnapshot::from_details");
                        revive_front_desk(&mut *tx, details.deleted_user.profile_id, data).await?
                    }
                    StaffRole::Admin => false,
                }
            }
            DeletionSnapshot::Practitioner(details) => {
                restore_practitioner_profile(&mut *tx, &details.deleted_practitioner).await?;
                false
            }
            DeletionSnapshot::FrontDesk(details) => {
                restore_front_desk_profile(&mut *tx, &details.deleted_front_desk).await?;
                false
            }
        };

        // The RESTORE entry commits with the restore itself: an entity is
        // never back without a record of who brought it back.
        let restore_entry = NewAuditEntry::new(actor, AuditAction::Restore, snapshot.entity_kind())
            .entity(snapshot.primary_id(), snapshot.primary_name())
            .details(json!({
                "restored_from_log_id": log_id,
                "dependent_restored": dependent_restored,
            }))
            .meta(meta);

        AuditRecorder::record_in(&mut *tx, restore_entry)
            .await
            .map_err(|e| RestoreError::Database(e.to_string()))?;

        tx.commit().await.map_err(RestoreError::from_db)?;

        info!(
            "Restored {} {} from audit entry {} (dependent profile: {})",
            entry.entity_type,
            snapshot.primary_id(),
            log_id,
            if dependent_restored { "restored" } else { "none" },
        );

        Ok(RestorationOutcome {
            entity_type: entry.entity_type,
            entity_id: snapshot.primary_id(),
            entity_name: Some(snapshot.primary_name().to_string()),
            entity: snapshot.to_details(),
            dependent_restored,
            restored_from_log_id: log_id,
        })
    }
}

// ==============================================================================
// PRIMARY ENTITIES: undelete the surviving row, or recreate it from snapshot
// ==============================================================================

async fn restore_patient(
    conn: &mut PgConnection,
    snap: &PatientSnapshot,
) -> Result<(), RestoreError> {
    let existing =
        sqlx::query_as::<_, SoftDeleteProbe>("SELECT is_deleted FROM patients WHERE id = $1")
            .bind(snap.id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;

    match existing {
        Some(probe) if !probe.is_deleted => Err(RestoreError::AlreadyRestored(format!(
            "patient {} is not deleted",
            snap.id
        ))),
        Some(_) => {
            sqlx::query(
                r#"
                UPDATE patients
                SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(snap.id)
            .execute(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;
            Ok(())
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO patients
                    (id, name, email, phone, birth_date, notes, is_deleted, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, NOW())
                "#,
            )
            .bind(snap.id)
            .bind(&snap.name)
            .bind(&snap.email)
            .bind(&snap.phone)
            .bind(snap.birth_date)
            .bind(&snap.notes)
            .bind(snap.created_at)
            .execute(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;
            Ok(())
        }
    }
}

async fn restore_staff_account(
    conn: &mut PgConnection,
    snap: &StaffSnapshot,
) -> Result<(), RestoreError> {
    let existing =
        sqlx::query_as::<_, SoftDeleteProbe>("SELECT is_deleted FROM staff_accounts WHERE id = $1")
            .bind(snap.id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;

    match existing {
        Some(probe) if !probe.is_deleted => Err(RestoreError::AlreadyRestored(format!(
            "staff account {} is not deleted",
            snap.id
        ))),
        Some(_) => {
            sqlx::query(
                r#"
                UPDATE staff_accounts
                SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(snap.id)
            .execute(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;
            Ok(())
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO staff_accounts
                    (id, username, name, role, profile_id, is_deleted, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, FALSE, $6, NOW())
                "#,
            )
            .bind(snap.id)
            .bind(&snap.username)
            .bind(&snap.name)
            .bind(snap.role)
            .bind(snap.profile_id)
            .bind(snap.created_at)
            .execute(&mut *conn)
            .await
            .map_err(RestoreError::from_db)?;
            Ok(())
        }
    }
}

async fn restore_practitioner_profile(
    conn: &mut PgConnection,
    snap: &PractitionerSnapshot,
) -> Result<(), RestoreError> {
    let existing = sqlx::query_as::<_, SoftDeleteProbe>(
        "SELECT is_deleted FROM practitioner_profiles WHERE id = $1",
    )
    .bind(snap.id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;

    match existing {
        Some(probe) if !probe.is_deleted => Err(RestoreError::AlreadyRestored(format!(
            "practitioner profile {} is not deleted",
            snap.id
        ))),
        Some(_) => {
            undelete_practitioner_by_id(conn, snap.id).await?;
            Ok(())
        }
        None => {
            insert_practitioner(conn, snap).await?;
            Ok(())
        }
    }
}

async fn restore_front_desk_profile(
    conn: &mut PgConnection,
    snap: &FrontDeskSnapshot,
) -> Result<(), RestoreError> {
    let existing = sqlx::query_as::<_, SoftDeleteProbe>(
        "SELECT is_deleted FROM front_desk_profiles WHERE id = $1",
    )
    .bind(snap.id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;

    match existing {
        Some(probe) if !probe.is_deleted => Err(RestoreError::AlreadyRestored(format!(
            "front-desk profile {} is not deleted",
            snap.id
        ))),
        Some(_) => {
            undelete_front_desk_by_id(conn, snap.id).await?;
            Ok(())
        }
        None => {
            insert_front_desk(conn, snap).await?;
            Ok(())
        }
    }
}

// ==============================================================================
// DEPENDENT PROFILES: undelete by linked id, then by legacy name match, and
// only recreate when nothing survives. Returns whether anything was revived
// (an already-active profile needs no work and is not an error).
// ==============================================================================

async fn revive_practitioner(
    conn: &mut PgConnection,
    linked_id: Option<Uuid>,
    snap: &PractitionerSnapshot,
) -> Result<bool, RestoreError> {
    let target_id = linked_id.unwrap_or(snap.id);

    if undelete_practitioner_by_id(conn, target_id).await? {
        return Ok(true);
    }

    let active: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM practitioner_profiles WHERE id = $1 AND is_deleted = FALSE)",
    )
    .bind(target_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;
    if active {
        return Ok(false);
    }

    // Legacy rows predate the profile_id link and are findable by name only.
    let undeleted = sqlx::query(
        r#"
        UPDATE practitioner_profiles
        SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
        WHERE id = (
            SELECT id FROM practitioner_profiles
            WHERE name = $1 AND is_deleted = TRUE
            ORDER BY created_at
            LIMIT 1
        )
        "#,
    )
    .bind(&snap.name)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?
    .rows_affected();
    if undeleted > 0 {
        return Ok(true);
    }

    let active_by_name: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM practitioner_profiles WHERE name = $1 AND is_deleted = FALSE)",
    )
    .bind(&snap.name)
    .fetch_one(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;
    if active_by_name {
        return Ok(false);
    }

    insert_practitioner(conn, snap).await?;
    Ok(true)
}

async fn revive_front_desk(
    conn: &mut PgConnection,
    linked_id: Option<Uuid>,
    snap: &FrontDeskSnapshot,
) -> Result<bool, RestoreError> {
    let target_id = linked_id.unwrap_or(snap.id);

    if undelete_front_desk_by_id(conn, target_id).await? {
        return Ok(true);
    }

    let active: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM front_desk_profiles WHERE id = $1 AND is_deleted = FALSE)",
    )
    .bind(target_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;
    if active {
        return Ok(false);
    }

    let undeleted = sqlx::query(
        r#"
        UPDATE front_desk_profiles
        SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
        WHERE id = (
            SELECT id FROM front_desk_profiles
            WHERE name = $1 AND is_deleted = TRUE
            ORDER BY created_at
            LIMIT 1
        )
        "#,
    )
    .bind(&snap.name)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?
    .rows_affected();
    if undeleted > 0 {
        return Ok(true);
    }

    let active_by_name: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM front_desk_profiles WHERE name = $1 AND is_deleted = FALSE)",
    )
    .bind(&snap.name)
    .fetch_one(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;
    if active_by_name {
        return Ok(false);
    }

    insert_front_desk(conn, snap).await?;
    Ok(true)
}

// ==============================================================================
// ROW HELPERS
// ==============================================================================

async fn undelete_practitioner_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<bool, RestoreError> {
    let rows = sqlx::query(
        r#"
        UPDATE practitioner_profiles
        SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
        WHERE id = $1 AND is_deleted = TRUE
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?
    .rows_affected();

    Ok(rows > 0)
}

async fn undelete_front_desk_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<bool, RestoreError> {
    let rows = sqlx::query(
        r#"
        UPDATE front_desk_profiles
        SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, updated_at = NOW()
        WHERE id = $1 AND is_deleted = TRUE
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?
    .rows_affected();

    Ok(rows > 0)
}

async fn insert_practitioner(
    conn: &mut PgConnection,
    snap: &PractitionerSnapshot,
) -> Result<(), RestoreError> {
    sqlx::query(
        r#"
        INSERT INTO practitioner_profiles
            (id, name, specialty, email, phone, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, $6, NOW())
        "#,
    )
    .bind(snap.id)
    .bind(&snap.name)
    .bind(&snap.specialty)
    .bind(&snap.email)
    .bind(&snap.phone)
    .bind(snap.created_at)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;

    Ok(())
}

async fn insert_front_desk(
    conn: &mut PgConnection,
    snap: &FrontDeskSnapshot,
) -> Result<(), RestoreError> {
    sqlx::query(
        r#"
        INSERT INTO front_desk_profiles
            (id, name, email, phone, shift, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, $6, NOW())
        "#,
    )
    .bind(snap.id)
    .bind(&snap.name)
    .bind(&snap.email)
    .bind(&snap.phone)
    .bind(&snap.shift)
    .bind(snap.created_at)
    .execute(&mut *conn)
    .await
    .map_err(RestoreError::from_db)?;

    Ok(())
}
