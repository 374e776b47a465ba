use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Resolved identity attached to every request by the upstream auth layer.
/// The core trusts this as given and performs no authentication itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "staff_role", rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Practitioner,
    FrontDesk,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Admin => write!(f, "admin"),
            StaffRole::Practitioner => write!(f, "practitioner"),
            StaffRole::FrontDesk => write!(f, "front_desk"),
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(StaffRole::Admin),
            "practitioner" => Ok(StaffRole::Practitioner),
            "front_desk" => Ok(StaffRole::FrontDesk),
            other => Err(format!("unknown staff role: {}", other)),
        }
    }
}

/// Request metadata captured for audit entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
