use uuid::Uuid;

use crate::models::{CheckinStats, TicketSummary, VerifyOutcome};
use crate::repository::TicketRepository;
use crate::services::admission::{AdmissibleTicket, DateValidity};
use crate::services::checkin::CheckinResult;
use crate::utils::error::AppError;

/// Event-wide ticket and check-in counts. Two plain reads with no shared
/// snapshot, so the pair may be momentarily inconsistent under load.
pub async fn event_stats(tickets: &dyn TicketRepository, event_id: Uuid) -> Result<CheckinStats, AppError> {
    let (total, checked_in) = tokio::try_join!(
        tickets.count_for_event(event_id),
        tickets.count_used_for_event(event_id),
    )?;

    Ok(CheckinStats { total, checked_in })
}

/// Outcome for a ticket whose admission day is not today.
pub fn date_outcome(admitted: &AdmissibleTicket) -> Option<VerifyOutcome> {
    let ticket = TicketSummary::new(&admitted.ticket, admitted.valid_for_date);
    match admitted.validity {
        DateValidity::NotValidYet => Some(VerifyOutcome::NotValidYet { ticket }),
        DateValidity::Expired => Some(VerifyOutcome::Expired { ticket }),
        DateValidity::ValidToday => None,
    }
}

pub fn checkin_outcome(admitted: &AdmissibleTicket, result: CheckinResult, stats: CheckinStats) -> VerifyOutcome {
    let ticket = TicketSummary::new(&admitted.ticket, admitted.valid_for_date);
    match result {
        CheckinResult::CheckedIn(record) => VerifyOutcome::CheckedIn {
            ticket,
            checked_in_at: record.checked_in_at,
            checked_in_by: record.checked_in_by,
            stats,
        },
        CheckinResult::AlreadyCheckedIn(record) => VerifyOutcome::AlreadyCheckedIn {
            ticket,
            checked_in_at: record.checked_in_at,
            checked_in_by: record.checked_in_by,
            stats,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckinRecord, NewCheckin};
    use crate::repository::{CheckinRepository, InMemoryStore};
    use chrono::{NaiveDate, Utc};

    fn admissible(store: &InMemoryStore, validity: DateValidity) -> AdmissibleTicket {
        let valid_for_date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let ticket = store
            .add_ticket(Uuid::new_v4(), "ABC123", Some(valid_for_date))
            .unwrap();
        AdmissibleTicket {
            ticket,
            valid_for_date,
            validity,
        }
    }

    #[tokio::test]
    async fn test_event_stats_counts_only_the_event() {
        let store = InMemoryStore::new();
        let event_id = Uuid::new_v4();
        let first = store.add_ticket(event_id, "E1", None).unwrap();
        store.add_ticket(event_id, "E2", None).unwrap();
        store.add_ticket(event_id, "E3", None).unwrap();
        store.add_ticket(Uuid::new_v4(), "OTHER", None).unwrap();
        store
            .record_checkin(NewCheckin {
                ticket_id: first.id,
                event_id,
                checked_in_by: Uuid::new_v4(),
                device_info: None,
            })
            .await
            .unwrap();

        let stats = event_stats(&store, event_id).await.unwrap();

        assert_eq!(stats, CheckinStats { total: 3, checked_in: 1 });
    }

    #[test]
    fn test_date_outcomes() {
        let store = InMemoryStore::new();

        let early = admissible(&store, DateValidity::NotValidYet);
        assert_eq!(date_outcome(&early).unwrap().as_str(), "not_valid_yet");

        let late = InMemoryStore::new();
        let late = admissible(&late, DateValidity::Expired);
        assert_eq!(date_outcome(&late).unwrap().as_str(), "expired");

        let today = InMemoryStore::new();
        assert!(date_outcome(&admissible(&today, DateValidity::ValidToday)).is_none());
    }

    #[test]
    fn test_checkin_outcome_uses_record_and_fallback_names() {
        let store = InMemoryStore::new();
        let admitted = admissible(&store, DateValidity::ValidToday);
        let record = CheckinRecord {
            id: Uuid::new_v4(),
            ticket_id: admitted.ticket.id,
            event_id: admitted.ticket.event_id,
            checked_in_by: Uuid::new_v4(),
            device_info: None,
            checked_in_at: Utc::now(),
        };
        let stats = CheckinStats { total: 1, checked_in: 1 };

        let outcome = checkin_outcome(&admitted, CheckinResult::AlreadyCheckedIn(record.clone()), stats);

        match outcome {
            VerifyOutcome::AlreadyCheckedIn {
                ticket,
                checked_in_at,
                checked_in_by,
                stats: s,
            } => {
                assert_eq!(ticket.attendee_name, "Guest");
                assert_eq!(ticket.tier_name, "Standard");
                assert_eq!(checked_in_at, record.checked_in_at);
                assert_eq!(checked_in_by, record.checked_in_by);
                assert_eq!(s, stats);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
