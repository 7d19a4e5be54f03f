use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Global platform role stored on `profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    Staff,
    Attendee,
}

impl Role {
    /// Roles allowed to check in tickets for every event.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Organizer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Staff => "staff",
            Role::Attendee => "attendee",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "organizer" => Ok(Role::Organizer),
            "staff" => Ok(Role::Staff),
            "attendee" => Ok(Role::Attendee),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub role: String,
}

impl Profile {
    /// Unknown role strings carry no privileges.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Attendee)
    }
}

/// Per-event grant of check-in authority, independent of the global role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffAssignment {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
