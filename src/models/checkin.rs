use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted proof that a ticket was admitted. At most one exists per ticket;
/// the `ticket_checkins.ticket_id` unique constraint enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CheckinRecord {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub event_id: Uuid,
    pub checked_in_by: Uuid,
    pub device_info: Option<String>,
    pub checked_in_at: DateTime<Utc>,
}

/// Insert payload. The timestamp is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCheckin {
    pub ticket_id: Uuid,
    pub event_id: Uuid,
    pub checked_in_by: Uuid,
    pub device_info: Option<String>,
}
