// libs/scheduling-cell/src/services/conflict.rs
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::SchedulingError;

/// The single source of truth for "is this booking allowed".
///
/// All appointment writes go through this check; request handlers never write
/// to the bookings table directly.
pub struct ConflictGuard;

impl ConflictGuard {
    /// Reject the proposed interval if any non-cancelled appointment of the
    /// same practitioner overlaps it (half-open). `excluding_appointment_id`
    /// skips the appointment being rescheduled.
    ///
    /// Must run on the connection of the transaction that performs the
    /// subsequent insert/update: the matching rows are locked so two
    /// concurrent requests for the same time cannot both pass between check
    /// and write.
    pub async fn validate(
        conn: &mut PgConnection,
        practitioner_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        excluding_appointment_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Checking conflicts for practitioner {} from {} to {}",
            practitioner_id, start_time, end_time
        );

        let conflicting: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM appointments
            WHERE practitioner_id = $1
              AND status <> 'cancelled'
              AND start_time < $3
              AND end_time > $2
              AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(practitioner_id)
        .bind(start_time)
        .bind(end_time)
        .bind(excluding_appointment_id)
        .fetch_optional(conn)
        .await
        .map_err(SchedulingError::from_db)?;

        if let Some(existing_id) = conflicting {
            warn!(
                "Conflict detected for practitioner {}: overlaps appointment {}",
                practitioner_id, existing_id
            );
            return Err(SchedulingError::Conflict);
        }

        Ok(())
    }
}
