use chrono::NaiveDate;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::Ticket;
use crate::repository::TicketRepository;
use crate::utils::error::AppError;

/// Where "today" falls relative to a ticket's admission day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValidity {
    NotValidYet,
    ValidToday,
    Expired,
}

/// Calendar-date comparison only; time of day never matters.
pub fn evaluate_date(valid_for_date: NaiveDate, today: NaiveDate) -> DateValidity {
    match today.cmp(&valid_for_date) {
        Ordering::Less => DateValidity::NotValidYet,
        Ordering::Equal => DateValidity::ValidToday,
        Ordering::Greater => DateValidity::Expired,
    }
}

/// A ticket that exists, belongs to the scanning event and has an admission
/// day.
#[derive(Debug, Clone)]
pub struct AdmissibleTicket {
    pub ticket: Ticket,
    pub valid_for_date: NaiveDate,
    pub validity: DateValidity,
}

pub async fn admit_ticket(
    tickets: &dyn TicketRepository,
    ticket_code: &str,
    event_id: Uuid,
    today: NaiveDate,
) -> Result<AdmissibleTicket, AppError> {
    let ticket = tickets
        .find_by_code(ticket_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    // A token signed for one event must not open another event's door.
    if ticket.event_id != event_id {
        return Err(AppError::WrongEvent);
    }

    let valid_for_date = ticket.valid_for_date.ok_or(AppError::NoValidDate)?;
    let validity = evaluate_date(valid_for_date, today);

    Ok(AdmissibleTicket {
        ticket,
        valid_for_date,
        validity,
    })
}
