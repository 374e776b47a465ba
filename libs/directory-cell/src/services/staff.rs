// libs/directory-cell/src/services/staff.rs
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use audit_cell::models::{AuditAction, EntityKind, NewAuditEntry};
use audit_cell::services::recorder::AuditRecorder;
use audit_cell::snapshot::{DeletionSnapshot, StaffDeletionDetails};
use shared_models::auth::{Actor, RequestMeta, StaffRole};

use crate::models::{
    CreateStaffRequest, DirectoryError, FrontDeskProfile, PractitionerProfile, StaffAccount,
};

const DEFAULT_SPECIALTY: &str = "General Dentistry";
const DEFAULT_SHIFT: &str = "full";

pub struct StaffService {
    pool: PgPool,
    recorder: AuditRecorder,
}

impl StaffService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            recorder: AuditRecorder::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<StaffAccount>, DirectoryError> {
        let accounts = sqlx::query_as::<_, StaffAccount>(
            "SELECT * FROM staff_accounts WHERE is_deleted = FALSE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(accounts)
    }

    pub async fn get(&self, account_id: Uuid) -> Result<Option<StaffAccount>, DirectoryError> {
        let account = sqlx::query_as::<_, StaffAccount>(
            "SELECT * FROM staff_accounts WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DirectoryError::from_db)?;

        Ok(account)
    }

    /// Create a staff account. Practitioner and front-desk roles provision
    /// their dependent profile in the same transaction and link it through
    /// `profile_id`.
    pub async fn create(
        &self,
        request: CreateStaffRequest,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<StaffAccount, DirectoryError> {
        if request.username.trim().is_empty() || request.name.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "username and name must not be empty".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(DirectoryError::from_db)?;

        let profile_id = match request.role {
            StaffRole::Practitioner => {
                let profile = sqlx::query_as::<_, PractitionerProfile>(
                    r#"
                    INSERT INTO practitioner_profiles (name, specialty, email, phone)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(&request.name)
                .bind(request.specialty.as_deref().unwrap_or(DEFAULT_SPECIALTY))
                .bind(&request.email)
                .bind(&request.phone)
                .fetch_one(&mut *tx)
                .await
                .map_err(DirectoryError::from_db)?;
                Some(profile.id)
            }
            StaffRole::FrontDesk => {
                let profile = sqlx::query_as::<_, FrontDeskProfile>(
                    r#"
                    INSERT INTO front_desk_profiles (name, email, phone, shift)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(&request.name)
                .bind(&request.email)
                .bind(&request.phone)
                .bind(request.shift.as_deref().unwrap_or(DEFAULT_SHIFT))
                .fetch_one(&mut *tx)
                .await
                .map_err(DirectoryError::from_db)?;
                Some(profile.id)
            }
            StaffRole::Admin => None,
        };

        let account = sqlx::query_as::<_, StaffAccount>(
            r#"
            INSERT INTO staff_accounts (username, name, role, profile_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.name)
        .bind(request.role)
        .bind(profile_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DirectoryError::from_db)?;

        tx.commit().await.map_err(DirectoryError::from_db)?;

        info!("Staff account {} created with role {}", account.id, account.role);

        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Create, EntityKind::StaffAccounts)
                .entity(account.id, account.name.clone())
                .details(serde_json::json!({ "user_data": account }))
                .meta(meta),
        );

        Ok(account)
    }

    /// Soft-delete a staff account together with its dependent profile.
    ///
    /// The snapshot of both rows is captured before any destructive write, in
    /// the same logical operation, and travels with the DELETE entry; both
    /// soft-deletes share one transaction.
    pub async fn delete(
        &self,
        account_id: Uuid,
        actor: &Actor,
        meta: &RequestMeta,
    ) -> Result<(), DirectoryError> {
        let account = self
            .get(account_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound("Staff account".to_string()))?;

        let mut details = StaffDeletionDetails {
            deleted_user: (&account).into(),
            practitioner_data: None,
            front_desk_data: None,
        };

        let mut tx = self.pool.begin().await.map_err(DirectoryError::from_db)?;

        // (profile id, table) of the dependent row to soft-delete alongside
        let mut dependent: Option<(Uuid, &'static str)> = None;
        match account.role {
            StaffRole::Practitioner => {
                if let Some(profile) =
                    find_practitioner(&mut *tx, account.profile_id, &account.name).await?
                {
                    dependent = Some((profile.id, "practitioner_profiles"));
                    details.practitioner_data = Some((&profile).into());
                } else {
                    warn!(
                        "Staff account {} has role practitioner but no active profile to capture",
                        account.id
                    );
                }
            }
            StaffRole::FrontDesk => {
                if let Some(profile) =
                    find_front_desk(&mut *tx, account.profile_id, &account.name).await?
                {
                    dependent = Some((profile.id, "front_desk_profiles"));
                    details.front_desk_data = Some((&profile).into());
                } else {
                    warn!(
                        "Staff account {} has role front_desk but no active profile to capture",
                        account.id
                    );
                }
            }
            StaffRole::Admin => {}
        }

        sqlx::query(
            r#"
            UPDATE staff_accounts
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(actor.id)
        .execute(&mut *tx)
        .await
        .map_err(DirectoryError::from_db)?;

        if let Some((profile_id, table)) = dependent {
            sqlx::query(&format!(
                r#"
                UPDATE {}
                SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
                WHERE id = $1
                "#,
                table
            ))
            .bind(profile_id)
            .bind(actor.id)
            .execute(&mut *tx)
            .await
            .map_err(DirectoryError::from_db)?;
        }

        tx.commit().await.map_err(DirectoryError::from_db)?;

        info!(
            "Staff account {} soft-deleted by {} (dependent profile: {:?})",
            account.id,
            actor.id,
            dependent.map(|(id, _)| id)
        );

        let snapshot = DeletionSnapshot::StaffAccount(details);
        self.recorder.record_detached(
            NewAuditEntry::new(actor, AuditAction::Delete, EntityKind::StaffAccounts)
                .entity(account.id, account.name.clone())
                .details(snapshot.to_details())
                .meta(meta),
        );

        Ok(())
    }
}

/// Resolve the dependent practitioner profile: by the explicit link when
/// present, by display name for legacy rows without one.
async fn find_practitioner(
    conn: &mut PgConnection,
    profile_id: Option<Uuid>,
    name: &str,
) -> Result<Option<PractitionerProfile>, DirectoryError> {
    if let Some(id) = profile_id {
        let profile = sqlx::query_as::<_, PractitionerProfile>(
            "SELECT * FROM practitioner_profiles WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DirectoryError::from_db)?;
        if profile.is_some() {
            return Ok(profile);
        }
        debug!("Linked practitioner profile {} not active, falling back to name match", id);
    }

    let profile = sqlx::query_as::<_, PractitionerProfile>(
        r#"
        SELECT * FROM practitioner_profiles
        WHERE name = $1 AND is_deleted = FALSE
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(DirectoryError::from_db)?;

    Ok(profile)
}

async fn find_front_desk(
    conn: &mut PgConnection,
    profile_id: Option<Uuid>,
    name: &str,
) -> Result<Option<FrontDeskProfile>, DirectoryError> {
    if let Some(id) = profile_id {
        let profile = sqlx::query_as::<_, FrontDeskProfile>(
            "SELECT * FROM front_desk_profiles WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DirectoryError::from_db)?;
        if profile.is_some() {
            return Ok(profile);
        }
        debug!("Linked front-desk profile {} not active, falling back to name match", id);
    }

    let profile = sqlx::query_as::<_, FrontDeskProfile>(
        r#"
        SELECT * FROM front_desk_profiles
        WHERE name = $1 AND is_deleted = FALSE
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(DirectoryError::from_db)?;

    Ok(profile)
}
