//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use di::Ref;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use table_reservations_api::core::services::MyReservationService;
use table_reservations_api::core::traits::NewReservation;
use table_reservations_api::infrastructure::database::DatabaseConnection;
use table_reservations_api::infrastructure::repositories::{
    DbReservationRepository, DbTableRepository,
};
use uuid::Uuid;

/// Setup test database with migrations
///
/// A single connection that never expires keeps the in-memory database alive
/// for the whole test.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

pub fn connection(pool: &SqlitePool) -> Ref<DatabaseConnection> {
    Arc::new(DatabaseConnection::from(pool.clone()))
}

/// A fixed day far enough ahead that every window starts in the future.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 6, 1, hour, minute, 0).unwrap()
}

pub async fn seed_restaurant(pool: &SqlitePool) -> Uuid {
    let restaurant_id = Uuid::new_v4();
    sqlx::query("INSERT INTO restaurants (id, name, address, phone) VALUES (?, ?, ?, ?)")
        .bind(restaurant_id)
        .bind("Test Bistro")
        .bind("1 Main Street")
        .bind("+100000000")
        .execute(pool)
        .await
        .unwrap();
    restaurant_id
}

pub async fn seed_table(pool: &SqlitePool, restaurant_id: Uuid, number: i32, capacity: i32) -> Uuid {
    let table_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tables (id, restaurant_id, table_number, capacity) VALUES (?, ?, ?, ?)",
    )
    .bind(table_id)
    .bind(restaurant_id)
    .bind(number)
    .bind(capacity)
    .execute(pool)
    .await
    .unwrap();
    table_id
}

pub async fn seed_user(pool: &SqlitePool, telegram_id: i64) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, telegram_id, phone, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(user_id)
        .bind("Test User")
        .bind(telegram_id)
        .bind(None::<String>)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    user_id
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

pub fn reservation_service(pool: &SqlitePool) -> MyReservationService {
    let connection = connection(pool);
    MyReservationService::new(
        Arc::new(DbTableRepository::new(connection.clone())),
        Arc::new(DbReservationRepository::new(connection)),
    )
}

pub fn booking(
    user_id: Uuid,
    restaurant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    guests: i32,
    tables: Vec<Uuid>,
) -> NewReservation {
    NewReservation {
        user_id,
        restaurant_id,
        start_time: start,
        end_time: end,
        guests,
        contact_name: "Alice".to_owned(),
        contact_phone: "+123456789".to_owned(),
        tables,
    }
}
