//! Storage interfaces used by the check-in pipeline.
//!
//! Each trait is deliberately narrow: the pipeline only ever looks up roles
//! and staff assignments, reads tickets and counts, and records a check-in.
//! [`postgres::PgStore`] backs them in production and
//! [`memory::InMemoryStore`] in tests and local runs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CheckinRecord, NewCheckin, Role, StaffAssignment, Ticket};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write. For check-ins this means
    /// another request already recorded the ticket.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return RepositoryError::DuplicateKey(constraint);
            }
        }
        RepositoryError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Roles and per-event staff grants.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Global role of the user, `None` when no profile exists.
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>>;

    async fn find_staff_assignment(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffAssignment>>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_code(&self, ticket_code: &str) -> Result<Option<Ticket>>;

    async fn count_for_event(&self, event_id: Uuid) -> Result<i64>;

    async fn count_used_for_event(&self, event_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait CheckinRepository: Send + Sync {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<CheckinRecord>>;

    /// Persists the check-in and marks the ticket `used` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateKey`] when the ticket already has a
    /// check-in record, whether or not the caller saw it beforehand.
    async fn record_checkin(&self, checkin: NewCheckin) -> Result<CheckinRecord>;
}
