//! Database and schema tests
//!
//! Tests SQLite migrations, repository transactions, and the overlap trigger

mod common;

use chrono::Utc;
use common::{at, connection, count, seed_restaurant, seed_table, seed_user, setup_test_db};
use sqlx::SqlitePool;
use table_reservations_api::core::domain::{
    Contacts, Reservation, ReservationStatus, ReservationTable, User,
};
use table_reservations_api::infrastructure::entities;
use table_reservations_api::infrastructure::error::StoreError;
use table_reservations_api::infrastructure::repositories::{
    DbReservationRepository, DbTableRepository, DbUserRepository,
};
use table_reservations_api::infrastructure::traits::{
    ReservationRepository, TableRepository, UserRepository,
};
use uuid::Uuid;

fn reservation(user_id: Uuid, restaurant_id: Uuid, start_hour: u32, end_hour: u32) -> Reservation {
    Reservation {
        id: Uuid::new_v4(),
        user_id,
        restaurant_id,
        start_time: at(start_hour, 0),
        end_time: at(end_hour, 0),
        status: ReservationStatus::Wait,
        capacity: 2,
        contacts: Contacts {
            name: "Alice".to_owned(),
            phone: "+123456789".to_owned(),
        },
    }
}

fn links(reservation: &Reservation, tables: &[Uuid]) -> Vec<ReservationTable> {
    tables
        .iter()
        .map(|&table_id| ReservationTable {
            id: Uuid::new_v4(),
            reservation_id: reservation.id,
            table_id,
        })
        .collect()
}

async fn stored_links(pool: &SqlitePool, reservation_id: Uuid) -> Vec<ReservationTable> {
    let rows: Vec<entities::ReservationTable> = sqlx::query_as(
        "SELECT id, reservation_id, table_id, created_at FROM reservation_tables WHERE reservation_id = ?",
    )
    .bind(reservation_id)
    .fetch_all(pool)
    .await
    .unwrap();
    rows.into_iter().map(ReservationTable::from).collect()
}

#[tokio::test]
async fn test_database_migrations_work() {
    let pool = setup_test_db().await;

    let names: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type IN ('table', 'trigger') ORDER BY name")
            .fetch_all(&pool)
            .await
            .unwrap();
    let names: Vec<String> = names.into_iter().map(|(name,)| name).collect();

    for expected in [
        "reservation_tables",
        "reservation_tables_no_overlap",
        "reservations",
        "restaurants",
        "tables",
        "users",
    ] {
        assert!(names.iter().any(|name| name == expected), "{expected} missing");
    }
}

#[tokio::test]
async fn test_reservation_and_links_are_stored_together() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let t2 = seed_table(&pool, restaurant, 2, 2).await;
    let user = seed_user(&pool, 2001).await;
    let repository = DbReservationRepository::new(connection(&pool));

    let new = reservation(user, restaurant, 10, 11);
    let new_links = links(&new, &[t1, t2]);
    let id = repository.create_reservation(&new, &new_links).await.unwrap();
    assert_eq!(id, new.id);

    let stored = repository.get_reservation(id).await.unwrap().unwrap();
    assert_eq!(stored, new);

    let mut stored_links = stored_links(&pool, id).await;
    stored_links.sort_by_key(|link| link.id);
    let mut expected = new_links.clone();
    expected.sort_by_key(|link| link.id);
    assert_eq!(stored_links, expected);

    // Status is stored as its integer code.
    let (status,): (i64,) = sqlx::query_as("SELECT status FROM reservations WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, 1);
}

#[tokio::test]
async fn test_failed_link_rolls_back_the_reservation() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let user = seed_user(&pool, 2002).await;
    let repository = DbReservationRepository::new(connection(&pool));

    // The second link points to a table that does not exist.
    let new = reservation(user, restaurant, 10, 11);
    let result = repository
        .create_reservation(&new, &links(&new, &[t1, Uuid::new_v4()]))
        .await;

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert!(repository.get_reservation(new.id).await.unwrap().is_none());
    assert_eq!(count(&pool, "reservations").await, 0);
    assert_eq!(count(&pool, "reservation_tables").await, 0);
}

#[tokio::test]
async fn test_trigger_rejects_overlapping_links() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let t2 = seed_table(&pool, restaurant, 2, 4).await;
    let user = seed_user(&pool, 2003).await;
    let repository = DbReservationRepository::new(connection(&pool));

    let first = reservation(user, restaurant, 10, 12);
    repository
        .create_reservation(&first, &links(&first, &[t1]))
        .await
        .unwrap();

    // Writes that skip the availability check still hit the trigger.
    let second = reservation(user, restaurant, 11, 13);
    let result = repository
        .create_reservation(&second, &links(&second, &[t2, t1]))
        .await;

    match result {
        Err(StoreError::TableUnavailable(table_id)) => assert_eq!(table_id, t1),
        other => panic!("expected TableUnavailable, got {other:?}"),
    }
    assert_eq!(count(&pool, "reservations").await, 1);
    assert_eq!(count(&pool, "reservation_tables").await, 1);
}

#[tokio::test]
async fn test_trigger_ignores_canceled_reservations() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let user = seed_user(&pool, 2004).await;
    let repository = DbReservationRepository::new(connection(&pool));
    let tables = DbTableRepository::new(connection(&pool));

    let mut first = reservation(user, restaurant, 10, 11);
    repository
        .create_reservation(&first, &links(&first, &[t1]))
        .await
        .unwrap();
    assert!(!tables.is_table_available(t1, at(10, 0), at(11, 0)).await.unwrap());

    first.status = ReservationStatus::Canceled;
    assert!(repository.update_reservation(&first).await.unwrap());
    assert!(tables.is_table_available(t1, at(10, 0), at(11, 0)).await.unwrap());

    let second = reservation(user, restaurant, 10, 11);
    repository
        .create_reservation(&second, &links(&second, &[t1]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_adjacent_windows_are_available() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let user = seed_user(&pool, 2005).await;
    let repository = DbReservationRepository::new(connection(&pool));
    let tables = DbTableRepository::new(connection(&pool));

    let first = reservation(user, restaurant, 10, 11);
    repository
        .create_reservation(&first, &links(&first, &[t1]))
        .await
        .unwrap();

    assert!(tables.is_table_available(t1, at(11, 0), at(12, 0)).await.unwrap());
    assert!(tables.is_table_available(t1, at(9, 0), at(10, 0)).await.unwrap());
    assert!(!tables.is_table_available(t1, at(9, 0), at(10, 30)).await.unwrap());

    let occupied = tables.occupied_tables_at(restaurant, at(10, 0)).await.unwrap();
    assert_eq!(occupied, vec![t1]);
    assert!(tables.occupied_tables_at(restaurant, at(11, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_of_missing_reservation_reports_false() {
    let pool = setup_test_db().await;
    let repository = DbReservationRepository::new(connection(&pool));

    let ghost = reservation(Uuid::new_v4(), Uuid::new_v4(), 10, 11);
    assert!(!repository.update_reservation(&ghost).await.unwrap());
}

#[tokio::test]
async fn test_schema_rejects_empty_window() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let user = seed_user(&pool, 2006).await;

    let result = sqlx::query(
        "INSERT INTO reservations (id, user_id, restaurant_id, start_time, end_time, status, capacity, contact_name, contact_phone, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(user)
    .bind(restaurant)
    .bind(at(10, 0))
    .bind(at(10, 0))
    .bind(ReservationStatus::Wait)
    .bind(2)
    .bind("Alice")
    .bind("")
    .bind(Utc::now())
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_reservation_delete_cascades_to_links() {
    let pool = setup_test_db().await;
    let restaurant = seed_restaurant(&pool).await;
    let t1 = seed_table(&pool, restaurant, 1, 4).await;
    let user = seed_user(&pool, 2007).await;
    let repository = DbReservationRepository::new(connection(&pool));

    let new = reservation(user, restaurant, 10, 11);
    repository
        .create_reservation(&new, &links(&new, &[t1]))
        .await
        .unwrap();

    sqlx::query("DELETE FROM reservations WHERE id = ?")
        .bind(new.id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(stored_links(&pool, new.id).await.is_empty());
}

#[tokio::test]
async fn test_users_are_unique_per_telegram_id() {
    let pool = setup_test_db().await;
    let repository = DbUserRepository::new(connection(&pool));

    let user = User {
        id: Uuid::new_v4(),
        name: "Alice".to_owned(),
        telegram_id: 42,
        phone: None,
    };
    let created = repository.create_user(&user).await.unwrap();
    assert_eq!(created, user);

    let duplicate = User {
        id: Uuid::new_v4(),
        ..user.clone()
    };
    assert!(repository.create_user(&duplicate).await.is_err());

    let found = repository.find_by_telegram_id(42).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);

    let mut renamed = found.clone();
    renamed.name = "Alicia".to_owned();
    renamed.phone = Some("+358401234567".to_owned());
    assert!(repository.update_user(&renamed).await.unwrap());
    assert_eq!(repository.get_user(user.id).await.unwrap(), Some(renamed));
}
