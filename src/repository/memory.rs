//! In-memory store.
//!
//! Mirrors the PostgreSQL schema closely enough to exercise the pipeline
//! without a database: check-ins are keyed by ticket id, so a second insert
//! for the same ticket fails with [`RepositoryError::DuplicateKey`] exactly
//! like the `ticket_checkins.ticket_id` unique constraint.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{AccessRepository, CheckinRepository, RepositoryError, Result, TicketRepository};
use crate::models::{CheckinRecord, NewCheckin, Role, StaffAssignment, Ticket, TicketStatus};

#[derive(Default)]
struct Tables {
    roles: HashMap<Uuid, Role>,
    staff: HashMap<(Uuid, Uuid), StaffAssignment>,
    tickets: HashMap<Uuid, Ticket>,
    checkins: HashMap<Uuid, CheckinRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Storage("in-memory store lock poisoned".to_string()))
    }

    pub fn set_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        self.lock()?.roles.insert(user_id, role);
        Ok(())
    }

    pub fn assign_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        let assignment = StaffAssignment {
            event_id,
            user_id,
            role: Role::Staff.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.lock()?.staff.insert((event_id, user_id), assignment);
        Ok(())
    }

    /// Adds an active ticket and returns it.
    pub fn add_ticket(
        &self,
        event_id: Uuid,
        ticket_code: &str,
        valid_for_date: Option<NaiveDate>,
    ) -> Result<Ticket> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            event_id,
            ticket_code: ticket_code.to_string(),
            status: TicketStatus::Active.as_str().to_string(),
            valid_for_date,
            attendee_name: None,
            tier_name: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_ticket(ticket.clone())?;
        Ok(ticket)
    }

    pub fn insert_ticket(&self, ticket: Ticket) -> Result<()> {
        let mut tables = self.lock()?;
        if tables
            .tickets
            .values()
            .any(|t| t.ticket_code == ticket.ticket_code && t.id != ticket.id)
        {
            return Err(RepositoryError::DuplicateKey(
                "tickets_ticket_code_key".to_string(),
            ));
        }
        tables.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    pub fn ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.lock()?.tickets.get(&ticket_id).cloned())
    }

    pub fn checkin_count(&self) -> Result<usize> {
        Ok(self.lock()?.checkins.len())
    }
}

#[async_trait]
impl AccessRepository for InMemoryStore {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>> {
        Ok(self.lock()?.roles.get(&user_id).copied())
    }

    async fn find_staff_assignment(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffAssignment>> {
        Ok(self.lock()?.staff.get(&(event_id, user_id)).cloned())
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_code(&self, ticket_code: &str) -> Result<Option<Ticket>> {
        Ok(self
            .lock()?
            .tickets
            .values()
            .find(|t| t.ticket_code == ticket_code)
            .cloned())
    }

    async fn count_for_event(&self, event_id: Uuid) -> Result<i64> {
        let tables = self.lock()?;
        Ok(tables.tickets.values().filter(|t| t.event_id == event_id).count() as i64)
    }

    async fn count_used_for_event(&self, event_id: Uuid) -> Result<i64> {
        let tables = self.lock()?;
        Ok(tables
            .tickets
            .values()
            .filter(|t| t.event_id == event_id && t.status() == Some(TicketStatus::Used))
            .count() as i64)
    }
}

#[async_trait]
impl CheckinRepository for InMemoryStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<CheckinRecord>> {
        Ok(self.lock()?.checkins.get(&ticket_id).cloned())
    }

    async fn record_checkin(&self, checkin: NewCheckin) -> Result<CheckinRecord> {
        let mut tables = self.lock()?;

        if tables.checkins.contains_key(&checkin.ticket_id) {
            return Err(RepositoryError::DuplicateKey(
                "ticket_checkins_ticket_id_key".to_string(),
            ));
        }

        let now = Utc::now();
        let record = CheckinRecord {
            id: Uuid::new_v4(),
            ticket_id: checkin.ticket_id,
            event_id: checkin.event_id,
            checked_in_by: checkin.checked_in_by,
            device_info: checkin.device_info,
            checked_in_at: now,
        };
        tables.checkins.insert(record.ticket_id, record.clone());

        if let Some(ticket) = tables.tickets.get_mut(&record.ticket_id) {
            ticket.status = TicketStatus::Used.as_str().to_string();
            ticket.updated_at = now;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_checkin_is_duplicate_key() {
        let store = InMemoryStore::new();
        let ticket = store.add_ticket(Uuid::new_v4(), "ABC123", None).unwrap();
        let checkin = NewCheckin {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            checked_in_by: Uuid::new_v4(),
            device_info: None,
        };

        store.record_checkin(checkin.clone()).await.unwrap();
        let err = store.record_checkin(checkin).await.unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
        assert_eq!(store.checkin_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_checkin_marks_ticket_used_and_counts() {
        let store = InMemoryStore::new();
        let event_id = Uuid::new_v4();
        let ticket = store.add_ticket(event_id, "A1", None).unwrap();
        store.add_ticket(event_id, "A2", None).unwrap();
        store.add_ticket(Uuid::new_v4(), "B1", None).unwrap();

        store
            .record_checkin(NewCheckin {
                ticket_id: ticket.id,
                event_id,
                checked_in_by: Uuid::new_v4(),
                device_info: Some("scanner-1".to_string()),
            })
            .await
            .unwrap();

        let stored = store.ticket(ticket.id).unwrap().unwrap();
        assert_eq!(stored.status(), Some(TicketStatus::Used));
        assert_eq!(store.count_for_event(event_id).await.unwrap(), 2);
        assert_eq!(store.count_used_for_event(event_id).await.unwrap(), 1);
    }

    #[test]
    fn test_ticket_codes_are_unique() {
        let store = InMemoryStore::new();
        store.add_ticket(Uuid::new_v4(), "SAME", None).unwrap();
        let err = store.add_ticket(Uuid::new_v4(), "SAME", None).unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
    }
}
