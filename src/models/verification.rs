use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ticket::Ticket;

/// Body of `POST /verify-qr`. Fields are optional at the wire level so that a
/// missing field is reported as `invalid_request` instead of a framework
/// rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQrRequest {
    pub qr_payload: Option<String>,
    pub event_id: Option<String>,
    pub device_info: Option<String>,
}

/// Event-wide counters attached to check-in outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckinStats {
    pub total: i64,
    pub checked_in: i64,
}

/// Display fields shared by every outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub ticket_id: Uuid,
    pub ticket_code: String,
    pub attendee_name: String,
    pub tier_name: String,
    pub valid_for_date: NaiveDate,
}

impl TicketSummary {
    pub fn new(ticket: &Ticket, valid_for_date: NaiveDate) -> Self {
        Self {
            ticket_id: ticket.id,
            ticket_code: ticket.ticket_code.clone(),
            attendee_name: ticket.attendee_display_name().to_string(),
            tier_name: ticket.tier_display_name().to_string(),
            valid_for_date,
        }
    }
}

/// Result of a scan that reached a decision. Serialized with a `status`
/// discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    CheckedIn {
        #[serde(flatten)]
        ticket: TicketSummary,
        checked_in_at: DateTime<Utc>,
        checked_in_by: Uuid,
        stats: CheckinStats,
    },
    AlreadyCheckedIn {
        #[serde(flatten)]
        ticket: TicketSummary,
        checked_in_at: DateTime<Utc>,
        checked_in_by: Uuid,
        stats: CheckinStats,
    },
    NotValidYet {
        #[serde(flatten)]
        ticket: TicketSummary,
    },
    Expired {
        #[serde(flatten)]
        ticket: TicketSummary,
    },
}

impl VerifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyOutcome::CheckedIn { .. } => "checked_in",
            VerifyOutcome::AlreadyCheckedIn { .. } => "already_checked_in",
            VerifyOutcome::NotValidYet { .. } => "not_valid_yet",
            VerifyOutcome::Expired { .. } => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyQrResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub outcome: VerifyOutcome,
}

impl From<VerifyOutcome> for VerifyQrResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        Self {
            ok: matches!(outcome, VerifyOutcome::CheckedIn { .. }),
            outcome,
        }
    }
}
