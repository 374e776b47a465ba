// libs/scheduling-cell/src/services/booking.rs
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::services::recorder::AuditRecorder;
use shared_models::auth::{Actor, RequestMeta};

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, SchedulingError,
    UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictGuard;

const INSERT_APPOINTMENT: &str = r#"
    INSERT INTO appointments
        (patient_id, practitioner_id, service_id, start_time, end_time, status, notes)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING *
"#;

const UPDATE_APPOINTMENT: &str = r#"
    UPDATE appointments
    SET start_time = $2, end_time = $3, status = $4, notes = $5, updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// Owns every write to the appointments table. Check and write share one
/// transaction; the audit entry follows the commit.
pub struct BookingService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<Appointment, SchedulingError> {
        if request.start_time >= request.end_time {
            return Err(SchedulingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        let status = request.status.unwrap_or(AppointmentStatus::Pending);
        if !status.holds_slot() {
            return Err(SchedulingError::Validation(
                "a new appointment cannot be created as cancelled".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(SchedulingError::from_db)?;

        ConflictGuard::validate(
            &mut *tx,
            request.practitioner_id,
            request.start_time,
            request.end_time,
            None,
        )
        .await?;

        let appointment = sqlx::query_as::<_, Appointment>(INSERT_APPOINTMENT)
            .bind(request.patient_id)
            .bind(request.practitioner_id)
            .bind(request.service_id)
            .bind(request.start_time)
            .bind(request.end_time)
            .bind(status)
            .bind(&request.notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(SchedulingError::from_db)?;

        tx.commit().await.map_err(SchedulingError::from_db)?;

        info!(
            "Appointment {} booked for practitioner {} at {}",
            appointment.id, appointment.practitioner_id, appointment.start_time
        );

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Create, EntityKind::Appointments)
                .entity(appointment.id, appointment.start_time.to_rfc3339())
                .details(json!({ "appointment_data": appointment }))
                .meta(meta),
        );

        Ok(appointment)
    }

    pub async fn update(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<Appointment, SchedulingError> {
        let existing = self
            .get(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment".to_string()))?;

        if matches!(request.status, Some(AppointmentStatus::Cancelled)) {
            return self.cancel(existing, request.notes, actor, meta).await;
        }

        let start_time = request.start_time.unwrap_or(existing.start_time);
        let end_time = request.end_time.unwrap_or(existing.end_time);
        let status = request.status.unwrap_or(existing.status);
        let notes = request.notes.clone().or_else(|| existing.notes.clone());

        if start_time >= end_time {
            return Err(SchedulingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(SchedulingError::from_db)?;

        // Re-validate whenever the result occupies time: times may have moved,
        // or a cancelled appointment may be coming back to life.
        if status.holds_slot() {
            ConflictGuard::validate(
                &mut *tx,
                existing.practitioner_id,
                start_time,
                end_time,
                Some(appointment_id),
            )
            .await?;
        }

        let updated = sqlx::query_as::<_, Appointment>(UPDATE_APPOINTMENT)
            .bind(appointment_id)
            .bind(start_time)
            .bind(end_time)
            .bind(status)
            .bind(&notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(SchedulingError::from_db)?;

        tx.commit().await.map_err(SchedulingError::from_db)?;

        debug!("Appointment {} updated", appointment_id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Update, EntityKind::Appointments)
                .entity(updated.id, updated.start_time.to_rfc3339())
                .details(json!({
                    "updated_data": request,
                    "previous_start_time": existing.start_time,
                    "previous_status": existing.status,
                }))
                .meta(meta),
        );

        Ok(updated)
    }

    /// Cancellation is a status transition; the row stays. Cancelling an
    /// already-cancelled appointment is a no-op.
    async fn cancel(
        &self,
        existing: Appointment,
        notes: Option<String>,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<Appointment, SchedulingError> {
        if !existing.status.holds_slot() {
            return Ok(existing);
        }

        let cancelled = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = 'cancelled', notes = COALESCE($2, notes), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(existing.id)
        .bind(&notes)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?;

        info!("Appointment {} cancelled", cancelled.id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Cancel, EntityKind::Appointments)
                .entity(cancelled.id, cancelled.start_time.to_rfc3339())
                .details(json!({ "cancelled_appointment": existing }))
                .meta(meta),
        );

        Ok(cancelled)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        let appointment =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
                .bind(appointment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(SchedulingError::from_db)?;

        Ok(appointment)
    }

    /// Non-cancelled appointments of a practitioner touching the given date,
    /// ascending. Feeds the slot engine.
    pub async fn list_active_for_practitioner_on_date(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = day_start + chrono::Duration::days(1);

        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE practitioner_id = $1
              AND status <> 'cancelled'
              AND start_time < $3
              AND end_time > $2
            ORDER BY start_time ASC
            "#,
        )
        .bind(practitioner_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?;

        Ok(appointments)
    }
}
