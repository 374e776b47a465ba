// libs/directory-cell/src/services/patients.rs
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::services::recorder::AuditRecorder;
use audit_cell::snapshot::{DeletionSnapshot, PatientDeletionDetails};
use shared_models::auth::{Actor, RequestMeta};

use crate::models::{CreatePatientRequest, DirectoryError, Patient};

pub struct PatientService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl PatientService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<Patient>, DirectoryError> {
        let patients = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients WHERE is_deleted = FALSE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(patients)
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<Option<Patient>, DirectoryError> {
        let patient = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(patient)
    }

    pub async fn create(
        &self,
        request: CreatePatientRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<Patient, DirectoryError> {
        if request.name.trim().is_empty() {
            return Err(DirectoryError::Validation("name must not be empty".to_string()));
        }

        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (name, email, phone, birth_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(request.birth_date)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        debug!("Patient {} created", patient.id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Create, EntityKind::Patients)
                .entity(patient.id, patient.name.clone())
                .details(serde_json::json!({ "patient_data": patient }))
                .meta(meta),
        );

        Ok(patient)
    }

    /// Soft-delete. The full row is captured before the destructive write and
    /// travels with the DELETE entry so the deletion can be reversed.
    pub async fn delete(
        &self,
        patient_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<(), DirectoryError> {
        let existing = self
            .get(patient_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound("Patient".to_string()))?;

        let snapshot = DeletionSnapshot::Patient(PatientDeletionDetails {
            deleted_patient: (&existing).into(),
        });

        sqlx::query(
            r#"
            UPDATE patients
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(patient_id)
        .bind(actor.id)
        .execute(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        info!("Patient {} soft-deleted by {}", patient_id, actor.id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Delete, EntityKind::Patients)
                .entity(existing.id, existing.name.clone())
                .details(snapshot.to_details())
                .meta(meta),
        );

        Ok(())
    }
}
