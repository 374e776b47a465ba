// libs/audit-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use shared_models::auth::{Actor, RequestMeta};

// ==============================================================================
// AUDIT LOG MODELS
// ==============================================================================

/// One immutable record of a mutating action. Entries are append-only; nothing
/// in the system updates or deletes a row once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub entity_name: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "audit_action", rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Restore,
    /// Cancellation is recorded as its own action rather than an UPDATE
    /// variant: it is the lifecycle event operators filter for.
    Cancel,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "CREATE"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
            AuditAction::Restore => write!(f, "RESTORE"),
            AuditAction::Cancel => write!(f, "CANCEL"),
        }
    }
}

/// Entity kinds tracked by the audit subsystem. The audit table stores the
/// string form so unknown kinds can still be listed; restoration only
/// understands the kinds enumerated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Patients,
    StaffAccounts,
    PractitionerProfiles,
    FrontDeskProfiles,
    Appointments,
    WorkingWindows,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Patients => "patients",
            EntityKind::StaffAccounts => "staff_accounts",
            EntityKind::PractitionerProfiles => "practitioner_profiles",
            EntityKind::FrontDeskProfiles => "front_desk_profiles",
            EntityKind::Appointments => "appointments",
            EntityKind::WorkingWindows => "working_windows",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patients" => Some(EntityKind::Patients),
            "staff_accounts" => Some(EntityKind::StaffAccounts),
            "practitioner_profiles" => Some(EntityKind::PractitionerProfiles),
            "front_desk_profiles" => Some(EntityKind::FrontDeskProfiles),
            "appointments" => Some(EntityKind::Appointments),
            "working_windows" => Some(EntityKind::WorkingWindows),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry waiting to be written. Built by the mutating code path with
/// whatever context it has; the recorder fills in nothing.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub entity_name: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    pub fn new(actor: &Actor, action: AuditAction, entity_type: EntityKind) -> Self {
        Self {
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            action,
            entity_type: entity_type.as_str().to_string(),
            entity_id: None,
            entity_name: None,
            details: Value::Null,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn entity(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.entity_id = Some(id);
        self.entity_name = Some(name.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn meta(mut self, meta: &RequestMeta) -> Self {
        self.ip_address = meta.ip_address.clone();
        self.user_agent = meta.user_agent.clone();
        self
    }
}

// ==============================================================================
// RESTORATION MODELS
// ==============================================================================

/// What a successful restoration did, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RestorationOutcome {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    /// The restored entity as reconstructed from the snapshot.
    pub entity: Value,
    pub dependent_restored: bool,
    pub restored_from_log_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_action_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(AuditAction::Delete).unwrap(),
            serde_json::json!("DELETE")
        );
        assert_eq!(
            serde_json::from_value::<AuditAction>(serde_json::json!("CANCEL")).unwrap(),
            AuditAction::Cancel
        );
    }

    #[test]
    fn entity_kind_round_trips() {
        for kind in [
            EntityKind::Patients,
            EntityKind::StaffAccounts,
            EntityKind::PractitionerProfiles,
            EntityKind::FrontDeskProfiles,
            EntityKind::Appointments,
            EntityKind::WorkingWindows,
        ] {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("finances"), None);
    }
}
