// libs/directory-cell/src/services/profiles.rs
//
// Professional profiles behind the staff accounts. Reads feed the scheduling
// surfaces; deletes are soft and snapshotted like every other people record.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::services::recorder::AuditRecorder;
use audit_cell::snapshot::{
    DeletionSnapshot, FrontDeskDeletionDetails, PractitionerDeletionDetails,
};
use shared_models::auth::{Actor, RequestMeta};

use crate::models::{DirectoryError, FrontDeskProfile, PractitionerProfile};

pub struct PractitionerService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl PractitionerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<PractitionerProfile>, DirectoryError> {
        let profiles = sqlx::query_as::<_, PractitionerProfile>(
            "SELECT * FROM practitioner_profiles WHERE is_deleted = FALSE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(profiles)
    }

    pub async fn get(&self, profile_id: Uuid) -> Result<Option<PractitionerProfile>, DirectoryError> {
        let profile = sqlx::query_as::<_, PractitionerProfile>(
            "SELECT * FROM practitioner_profiles WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(profile)
    }

    pub async fn delete(
        &self,
        profile_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<(), DirectoryError> {
        let existing = self
            .get(profile_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound("Practitioner".to_string()))?;

        let snapshot = DeletionSnapshot::Practitioner(PractitionerDeletionDetails {
            deleted_practitioner: (&existing).into(),
        });

        sqlx::query(
            r#"
            UPDATE practitioner_profiles
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .bind(actor.id)
        .execute(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        info!("Practitioner profile {} soft-deleted by {}", profile_id, actor.id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Delete, EntityKind::PractitionerProfiles)
                .entity(existing.id, existing.name.clone())
                .details(snapshot.to_details())
                .meta(meta),
        );

        Ok(())
    }
}

pub struct FrontDeskService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl FrontDeskService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<FrontDeskProfile>, DirectoryError> {
        let profiles = sqlx::query_as::<_, FrontDeskProfile>(
            "SELECT * FROM front_desk_profiles WHERE is_deleted = FALSE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(profiles)
    }

    pub async fn get(&self, profile_id: Uuid) -> Result<Option<FrontDeskProfile>, DirectoryError> {
        let profile = sqlx::query_as::<_, FrontDeskProfile>(
            "SELECT * FROM front_desk_profiles WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(profile)
    }

    pub async fn delete(
        &self,
        profile_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<(), DirectoryError> {
        let existing = self
            .get(profile_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound("Front-desk profile".to_string()))?;

        let snapshot = DeletionSnapshot::FrontDesk(FrontDeskDeletionDetails {
            deleted_front_desk: (&existing).into(),
        });

        sqlx::query(
            r#"
            UPDATE front_desk_profiles
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .bind(actor.id)
        .execute(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        info!("Front-desk profile {} soft-deleted by {}", profile_id, actor.id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Delete, EntityKind::FrontDeskProfiles)
                .entity(existing.id, existing.name.clone())
                .details(snapshot.to_details())
                .meta(meta),
        );

        Ok(())
    }
}
