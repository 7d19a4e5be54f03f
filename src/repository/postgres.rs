use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccessRepository, CheckinRepository, Result, TicketRepository};
use crate::models::{CheckinRecord, NewCheckin, Profile, Role, StaffAssignment, Ticket, TicketStatus};

/// PostgreSQL-backed store for every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccessRepository for PgStore {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT id, role FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile.map(|p| p.role()))
    }

    async fn find_staff_assignment(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<StaffAssignment>> {
        let assignment = sqlx::query_as::<_, StaffAssignment>(
            r#"
            SELECT event_id, user_id, role, created_at
            FROM event_staff
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn find_by_code(&self, ticket_code: &str) -> Result<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, event_id, ticket_code, status, valid_for_date,
                   attendee_name, tier_name, created_at, updated_at
            FROM tickets
            WHERE ticket_code = $1
            "#,
        )
        .bind(ticket_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn count_for_event(&self, event_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_used_for_event(&self, event_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tickets WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(TicketStatus::Used.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl CheckinRepository for PgStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<CheckinRecord>> {
        let record = sqlx::query_as::<_, CheckinRecord>(
            r#"
            SELECT id, ticket_id, event_id, checked_in_by, device_info, checked_in_at
            FROM ticket_checkins
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn record_checkin(&self, checkin: NewCheckin) -> Result<CheckinRecord> {
        // The insert and the status update commit together; a unique
        // violation on ticket_id rolls both back.
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, CheckinRecord>(
            r#"
            INSERT INTO ticket_checkins (id, ticket_id, event_id, checked_in_by, device_info)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, ticket_id, event_id, checked_in_by, device_info, checked_in_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(checkin.ticket_id)
        .bind(checkin.event_id)
        .bind(checkin.checked_in_by)
        .bind(checkin.device_info)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE tickets SET status = $1, updated_at = now() WHERE id = $2")
            .bind(TicketStatus::Used.as_str())
            .bind(record.ticket_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(record)
    }
}
