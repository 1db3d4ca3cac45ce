//! DB Repository abstractions

use crate::core::domain::{Reservation, ReservationStatus, ReservationTable, Restaurant, Table, User};
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities;
use crate::infrastructure::error::StoreError;
use crate::infrastructure::traits::{ReservationRepository, TableRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use log::{debug, error, warn};
use uuid::Uuid;

const TABLE_COLUMNS: &str =
    "tables.id, tables.restaurant_id, tables.table_number, tables.capacity, tables.position_x, tables.position_y, tables.position_z";

const RESERVATION_COLUMNS: &str = "id, user_id, restaurant_id, start_time, end_time, status, capacity, contact_name, contact_phone, created_at";

fn log_error(e: sqlx::Error) -> StoreError {
    error!("{e}");
    StoreError::Database(e)
}

fn into_domain(rows: Vec<entities::Reservation>) -> Vec<Reservation> {
    rows.into_iter().map(Reservation::from).collect()
}

#[injectable(TableRepository)]
pub struct DbTableRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbTableRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TableRepository for DbTableRepository {
    async fn get_table(&self, table_id: Uuid) -> Result<Option<Table>, StoreError> {
        let table: Option<entities::Table> =
            sqlx::query_as(&format!("SELECT {TABLE_COLUMNS} FROM tables WHERE id = ?"))
                .bind(table_id)
                .fetch_optional(&**self.connection)
                .await
                .map_err(log_error)?;

        Ok(table.map(Table::from))
    }

    async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        let restaurant: Option<entities::Restaurant> =
            sqlx::query_as("SELECT id, name, address, phone FROM restaurants WHERE id = ?")
                .bind(restaurant_id)
                .fetch_optional(&**self.connection)
                .await
                .map_err(log_error)?;

        Ok(restaurant.map(Restaurant::from))
    }

    async fn tables_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Table>, StoreError> {
        let tables: Vec<entities::Table> = sqlx::query_as(&format!(
            "SELECT {TABLE_COLUMNS} FROM tables WHERE restaurant_id = ? ORDER BY table_number ASC"
        ))
        .bind(restaurant_id)
        .fetch_all(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(tables.into_iter().map(Table::from).collect())
    }

    async fn tables_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Table>, StoreError> {
        let tables: Vec<entities::Table> = sqlx::query_as(&format!(
            "SELECT {TABLE_COLUMNS} FROM tables INNER JOIN reservation_tables ON reservation_tables.table_id = tables.id WHERE reservation_tables.reservation_id = ? ORDER BY tables.table_number ASC"
        ))
        .bind(reservation_id)
        .fetch_all(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(tables.into_iter().map(Table::from).collect())
    }

    async fn is_table_available(
        &self,
        table_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let (overlapping,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reservation_tables INNER JOIN reservations ON reservations.id = reservation_tables.reservation_id WHERE reservation_tables.table_id = ? AND reservations.status != ? AND reservations.start_time < ? AND reservations.end_time > ?",
        )
        .bind(table_id)
        .bind(ReservationStatus::Canceled)
        .bind(end)
        .bind(start)
        .fetch_one(&**self.connection)
        .await
        .map_err(log_error)?;

        debug!("table {table_id} has {overlapping} overlapping reservations");
        Ok(overlapping == 0)
    }

    async fn occupied_tables_at(
        &self,
        restaurant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, StoreError> {
        let occupied: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT reservation_tables.table_id FROM reservation_tables INNER JOIN reservations ON reservations.id = reservation_tables.reservation_id WHERE reservations.restaurant_id = ? AND reservations.status != ? AND reservations.start_time <= ? AND reservations.end_time > ?",
        )
        .bind(restaurant_id)
        .bind(ReservationStatus::Canceled)
        .bind(at)
        .bind(at)
        .fetch_all(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(occupied.into_iter().map(|(table_id,)| table_id).collect())
    }
}

#[injectable(ReservationRepository)]
pub struct DbReservationRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbReservationRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ReservationRepository for DbReservationRepository {
    async fn create_reservation(
        &self,
        reservation: &Reservation,
        links: &[ReservationTable],
    ) -> Result<Uuid, StoreError> {
        // Dropping `tx` on any early return rolls back every row written so far.
        let mut tx = self.connection.begin().await.map_err(log_error)?;

        sqlx::query(
            "INSERT INTO reservations (id, user_id, restaurant_id, start_time, end_time, status, capacity, contact_name, contact_phone, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(reservation.id)
        .bind(reservation.user_id)
        .bind(reservation.restaurant_id)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(reservation.status)
        .bind(reservation.capacity)
        .bind(&reservation.contacts.name)
        .bind(&reservation.contacts.phone)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(log_error)?;

        for link in links {
            sqlx::query(
                "INSERT INTO reservation_tables (id, reservation_id, table_id, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(link.id)
            .bind(reservation.id)
            .bind(link.table_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let e = StoreError::from_link_insert(e, link.table_id);
                match &e {
                    StoreError::TableUnavailable(table_id) => {
                        warn!("exclusion constraint rejected table {table_id}")
                    }
                    StoreError::Database(db_error) => error!("{db_error}"),
                }
                e
            })?;
        }

        tx.commit().await.map_err(log_error)?;

        Ok(reservation.id)
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE reservations SET status = ?, capacity = ?, contact_name = ?, contact_phone = ? WHERE id = ?",
        )
        .bind(reservation.status)
        .bind(reservation.capacity)
        .bind(&reservation.contacts.name)
        .bind(&reservation.contacts.phone)
        .bind(reservation.id)
        .execute(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        let reservation: Option<entities::Reservation> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?"
        ))
        .bind(reservation_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(reservation.map(Reservation::from))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = ? ORDER BY start_time ASC"
        ))
        .bind(user_id)
        .fetch_all(&**self.connection)
        .await
        .map(into_domain)
        .map_err(log_error)
    }

    async fn list_for_user_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = ? AND start_time >= ? AND start_time < ? ORDER BY start_time ASC"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&**self.connection)
        .await
        .map(into_domain)
        .map_err(log_error)
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE start_time >= ? AND start_time < ? ORDER BY start_time ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&**self.connection)
        .await
        .map(into_domain)
        .map_err(log_error)
    }
}

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbUserRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, StoreError> {
        let user: Option<entities::User> = sqlx::query_as(
            "SELECT id, name, telegram_id, phone, created_at FROM users WHERE telegram_id = ?",
        )
        .bind(telegram_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(user.map(User::from))
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user: Option<entities::User> =
            sqlx::query_as("SELECT id, name, telegram_id, phone, created_at FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&**self.connection)
                .await
                .map_err(log_error)?;

        Ok(user.map(User::from))
    }

    async fn create_user(&self, user: &User) -> Result<User, StoreError> {
        let created: entities::User = sqlx::query_as(
            "INSERT INTO users (id, name, telegram_id, phone, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.telegram_id)
        .bind(&user.phone)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(log_error)?;

        Ok(created.into())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET name = ?, phone = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.phone)
            .bind(user.id)
            .execute(&**self.connection)
            .await
            .map_err(log_error)?;

        Ok(result.rows_affected() > 0)
    }
}
