//! Runs against a real PostgreSQL when `DATABASE_URL` is set; otherwise each
//! test returns early.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use checkin_server::models::{NewCheckin, TicketStatus};
use checkin_server::repository::{CheckinRepository, PgStore, RepositoryError, TicketRepository};
use checkin_server::services::checkin::{check_in, CheckinResult};

async fn connect() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    Some(pool)
}

/// Inserts a fresh active ticket for a fresh event and returns (event_id, ticket_id).
async fn seed_ticket(pool: &PgPool) -> (Uuid, Uuid) {
    let event_id = Uuid::new_v4();
    let ticket_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tickets (id, event_id, ticket_code, valid_for_date) VALUES ($1, $2, $3, CURRENT_DATE)",
    )
    .bind(ticket_id)
    .bind(event_id)
    .bind(format!("PG-{}", ticket_id.simple()))
    .execute(pool)
    .await
    .unwrap();

    (event_id, ticket_id)
}

async fn checkin_rows(pool: &PgPool, ticket_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ticket_checkins WHERE ticket_id = $1")
        .bind(ticket_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn ticket_status(pool: &PgPool, ticket_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1")
        .bind(ticket_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn second_insert_for_a_ticket_is_a_duplicate_key() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (event_id, ticket_id) = seed_ticket(&pool).await;
    let new_checkin = |staff: Uuid| NewCheckin {
        ticket_id,
        event_id,
        checked_in_by: staff,
        device_info: Some("gate-1".to_string()),
    };

    let first = store.record_checkin(new_checkin(Uuid::new_v4())).await.unwrap();
    assert_eq!(first.ticket_id, ticket_id);

    let second = store.record_checkin(new_checkin(Uuid::new_v4())).await;
    assert!(matches!(second, Err(RepositoryError::DuplicateKey(_))));

    assert_eq!(checkin_rows(&pool, ticket_id).await, 1);
    assert_eq!(ticket_status(&pool, ticket_id).await, TicketStatus::Used.as_str());
    assert_eq!(store.count_used_for_event(event_id).await.unwrap(), 1);
    assert_eq!(store.count_for_event(event_id).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_check_ins_record_one_row() {
    let Some(pool) = connect().await else { return };
    let store = PgStore::new(pool.clone());
    let (_, ticket_id) = seed_ticket(&pool).await;
    let ticket = sqlx::query_scalar::<_, String>("SELECT ticket_code FROM tickets WHERE id = $1")
        .bind(ticket_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let ticket = store.find_by_code(&ticket).await.unwrap().unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let ticket = ticket.clone();
        handles.push(tokio::spawn(async move {
            check_in(&store, &ticket, Uuid::new_v4(), None).await.unwrap()
        }));
    }

    let mut checked_in = 0;
    for handle in handles {
        if let CheckinResult::CheckedIn(_) = handle.await.unwrap() {
            checked_in += 1;
        }
    }

    assert_eq!(checked_in, 1);
    assert_eq!(checkin_rows(&pool, ticket_id).await, 1);
    assert_eq!(ticket_status(&pool, ticket_id).await, TicketStatus::Used.as_str());
}
