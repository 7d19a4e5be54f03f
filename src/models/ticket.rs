use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fallback shown when a ticket carries no attendee name.
pub const DEFAULT_ATTENDEE_NAME: &str = "Guest";
/// Fallback shown when a ticket carries no tier name.
pub const DEFAULT_TIER_NAME: &str = "Standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Refunded,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Used => "used",
            TicketStatus::Refunded => "refunded",
            TicketStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TicketStatus::Active),
            "used" => Ok(TicketStatus::Used),
            "refunded" => Ok(TicketStatus::Refunded),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(format!("unknown ticket status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_code: String,
    pub status: String,
    pub valid_for_date: Option<NaiveDate>,
    pub attendee_name: Option<String>,
    pub tier_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn status(&self) -> Option<TicketStatus> {
        self.status.parse().ok()
    }

    pub fn attendee_display_name(&self) -> &str {
        non_blank(self.attendee_name.as_deref()).unwrap_or(DEFAULT_ATTENDEE_NAME)
    }

    pub fn tier_display_name(&self) -> &str {
        non_blank(self.tier_name.as_deref()).unwrap_or(DEFAULT_TIER_NAME)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
