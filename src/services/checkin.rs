//! First-scan-wins check-in.
//!
//! A ticket moves from unseen to checked in exactly once. The existence check
//! below only saves a write on repeat scans; the storage unique constraint on
//! the ticket id decides which of several concurrent scans wins.

use tracing::{info, warn};

use crate::models::{CheckinRecord, NewCheckin, Ticket};
use crate::repository::{CheckinRepository, RepositoryError};
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinResult {
    /// This request recorded the check-in.
    CheckedIn(CheckinRecord),
    /// Someone recorded it first; carries their record.
    AlreadyCheckedIn(CheckinRecord),
}

pub async fn check_in(
    checkins: &dyn CheckinRepository,
    ticket: &Ticket,
    staff_id: uuid::Uuid,
    device_info: Option<String>,
) -> Result<CheckinResult, AppError> {
    if let Some(existing) = checkins.find_by_ticket(ticket.id).await? {
        return Ok(CheckinResult::AlreadyCheckedIn(existing));
    }

    let new_checkin = NewCheckin {
        ticket_id: ticket.id,
        event_id: ticket.event_id,
        checked_in_by: staff_id,
        device_info,
    };

    match checkins.record_checkin(new_checkin).await {
        Ok(record) => {
            info!(ticket_id = %ticket.id, staff_id = %staff_id, "Ticket checked in");
            Ok(CheckinResult::CheckedIn(record))
        }
        Err(RepositoryError::DuplicateKey(constraint)) => {
            warn!(ticket_id = %ticket.id, %constraint, "Concurrent check-in lost the race");
            checkins
                .find_by_ticket(ticket.id)
                .await?
                .map(CheckinResult::AlreadyCheckedIn)
                .ok_or_else(|| {
                    AppError::InternalServerError(
                        "duplicate check-in reported but no record found".to_string(),
                    )
                })
        }
        Err(e) => Err(AppError::RepositoryError(e)),
    }
}
