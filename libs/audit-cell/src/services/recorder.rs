// libs/audit-cell/src/services/recorder.rs
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AuditError;
use crate::models::{AuditLogEntry, NewAuditEntry};

const INSERT_ENTRY: &str = r#"
    INSERT INTO audit_logs
        (actor_id, actor_name, action, entity_type, entity_id, entity_name,
         details, ip_address, user_agent)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING id, actor_id, actor_name, action, entity_type, entity_id,
              entity_name, details, ip_address, user_agent, created_at
"#;

/// Append-only writer and query surface for the audit trail.
pub struct AuditRecorder {
    pool: PgPool,
}

impl AuditRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write an entry immediately on the shared pool.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        Self::insert(&self.pool, entry).await
    }

    /// Write an entry on an open connection, so the entry commits or rolls
    /// back together with the caller's transaction. Restoration uses this;
    /// ordinary mutations must not.
    pub async fn record_in(
        conn: &mut PgConnection,
        entry: NewAuditEntry,
    ) -> Result<AuditLogEntry, AuditError> {
        Self::insert(conn, entry).await
    }

    /// Write an entry after the primary operation has already committed.
    ///
    /// Fire-and-forget: the task runs off the request path, failures are
    /// logged for operators and never reach the caller. The primary action
    /// stays available even when the audit store is not.
    pub fn record_detached(&self, entry: NewAuditEntry) {
        let pool = self.pool.clone();
        let context = format!("{} {}", entry.action, entry.entity_type);

        tokio::spawn(async move {
            match Self::insert(&pool, entry).await {
                Ok(written) => {
                    debug!("Audit entry {} recorded ({})", written.id, context);
                }
                Err(e) => {
                    error!("Audit entry lost ({}): {}", context, e);
                }
            }
        });
    }

    async fn insert<'e, E>(executor: E, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let written = sqlx::query_as::<_, AuditLogEntry>(INSERT_ENTRY)
            .bind(entry.actor_id)
            .bind(&entry.actor_name)
            .bind(entry.action)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.entity_name)
            .bind(&entry.details)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .fetch_one(executor)
            .await?;

        Ok(written)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn list_for_actor(
        &self,
        actor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs WHERE actor_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(actor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT * FROM audit_logs
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn list_for_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT * FROM audit_logs
            WHERE created_at >= $1 AND created_at <= $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
