// libs/scheduling-cell/src/services/windows.rs
use serde_json::json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::services::recorder::AuditRecorder;
use shared_models::auth::{Actor, RequestMeta};

use crate::models::{
    CreateWorkingWindowRequest, DayOfWeek, SchedulingError, UpdateWorkingWindowRequest,
    WorkingWindow,
};

const DEFAULT_SLOT_DURATION_MINUTES: i32 = 30;

/// Owns the recurring weekly availability windows per practitioner.
pub struct WorkingWindowService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl WorkingWindowService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn list_for_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Vec<WorkingWindow>, SchedulingError> {
        let windows = sqlx::query_as::<_, WorkingWindow>(
            r#"
            SELECT * FROM working_windows
            WHERE practitioner_id = $1
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(practitioner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?;

        Ok(windows)
    }

    pub async fn list_for_day(
        &self,
        practitioner_id: Uuid,
        day_of_week: DayOfWeek,
    ) -> Result<Vec<WorkingWindow>, SchedulingError> {
        let windows = sqlx::query_as::<_, WorkingWindow>(
            r#"
            SELECT * FROM working_windows
            WHERE practitioner_id = $1 AND day_of_week = $2
            ORDER BY start_time
            "#,
        )
        .bind(practitioner_id)
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?;

        Ok(windows)
    }

    pub async fn create(
        &self,
        practitioner_id: Uuid,
        request: CreateWorkingWindowRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<WorkingWindow, SchedulingError> {
        let slot_duration = request
            .slot_duration_minutes
            .unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
        validate_window(request.start_time, request.end_time, slot_duration)?;

        let window = sqlx::query_as::<_, WorkingWindow>(
            r#"
            INSERT INTO working_windows
                (practitioner_id, day_of_week, start_time, end_time, slot_duration_minutes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(practitioner_id)
        .bind(request.day_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(slot_duration)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?;

        debug!(
            "Working window {} created for practitioner {} ({})",
            window.id, practitioner_id, window.day_of_week
        );

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Create, EntityKind::WorkingWindows)
                .entity(window.id, window.day_of_week.to_string())
                .details(json!({ "window_data": window }))
                .meta(meta),
        );

        Ok(window)
    }

    pub async fn update(
        &self,
        window_id: Uuid,
        request: UpdateWorkingWindowRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<WorkingWindow, SchedulingError> {
        validate_window(
            request.start_time,
            request.end_time,
            request.slot_duration_minutes,
        )?;

        let updated = sqlx::query_as::<_, WorkingWindow>(
            r#"
            UPDATE working_windows
            SET day_of_week = $2, start_time = $3, end_time = $4,
                slot_duration_minutes = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(window_id)
        .bind(request.day_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.slot_duration_minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?
        .ok_or_else(|| SchedulingError::NotFound("Working window".to_string()))?;

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Update, EntityKind::WorkingWindows)
                .entity(updated.id, updated.day_of_week.to_string())
                .details(json!({ "updated_data": updated }))
                .meta(meta),
        );

        Ok(updated)
    }

    pub async fn delete(
        &self,
        window_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<(), SchedulingError> {
        let deleted = sqlx::query_as::<_, WorkingWindow>(
            "DELETE FROM working_windows WHERE id = $1 RETURNING *",
        )
        .bind(window_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::from_db)?
        .ok_or_else(|| SchedulingError::NotFound("Working window".to_string()))?;

        debug!("Working window {} deleted", window_id);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Delete, EntityKind::WorkingWindows)
                .entity(deleted.id, deleted.day_of_week.to_string())
                .details(json!({ "deleted_window": deleted }))
                .meta(meta),
        );

        Ok(())
    }
}

fn validate_window(
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
    slot_duration_minutes: i32,
) -> Result<(), SchedulingError> {
    if start_time >= end_time {
        return Err(SchedulingError::Validation(
            "start_time must be before end_time".to_string(),
        ));
    }
    if slot_duration_minutes <= 0 {
        return Err(SchedulingError::Validation(
            "slot_duration_minutes must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;

    #[test]
    fn window_bounds_must_be_ordered() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        assert!(validate_window(nine, ten, 30).is_ok());
        assert_matches!(validate_window(ten, nine, 30), Err(SchedulingError::Validation(_)));
        assert_matches!(validate_window(nine, nine, 30), Err(SchedulingError::Validation(_)));
    }

    #[test]
    fn slot_duration_must_be_positive() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        assert_matches!(validate_window(nine, ten, 0), Err(SchedulingError::Validation(_)));
        assert_matches!(validate_window(nine, ten, -30), Err(SchedulingError::Validation(_)));
    }
}
