//! Infrastructure traits, used for DI on higher levels
//!
//! Each consumer depends only on the capability it needs.

use crate::core::domain::{Reservation, Restaurant, ReservationTable, Table, User};
use crate::infrastructure::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn get_table(&self, table_id: Uuid) -> Result<Option<Table>, StoreError>;

    async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, StoreError>;

    async fn tables_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Table>, StoreError>;

    /// Tables linked to the given reservation, ordered by table number.
    async fn tables_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Table>, StoreError>;

    /// Returns `true` when no live reservation linked to the table overlaps
    /// `[start, end)`.
    async fn is_table_available(
        &self,
        table_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Ids of the restaurant's tables held by a live reservation at `at`.
    async fn occupied_tables_at(
        &self,
        restaurant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, StoreError>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Inserts the reservation and all of its link rows in one transaction.
    ///
    /// Nothing is persisted if any insert fails.
    async fn create_reservation(
        &self,
        reservation: &Reservation,
        links: &[ReservationTable],
    ) -> Result<Uuid, StoreError>;

    /// Overwrites the mutable columns. Returns `false` if the row does not exist.
    async fn update_reservation(&self, reservation: &Reservation) -> Result<bool, StoreError>;

    async fn get_reservation(&self, reservation_id: Uuid)
    -> Result<Option<Reservation>, StoreError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, StoreError>;

    /// Reservations of the user starting within `[from, to)`.
    async fn list_for_user_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// All reservations starting within `[from, to)`.
    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, StoreError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: &User) -> Result<User, StoreError>;

    /// Returns `false` if the user does not exist.
    async fn update_user(&self, user: &User) -> Result<bool, StoreError>;
}
