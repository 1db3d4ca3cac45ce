//! DI "Interfaces"

use crate::core::domain::{ReservationDetails, ReservationStatus, TableAvailability, User};
use crate::core::error::{AuthError, ReservationError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// What a caller asks for when booking.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub guests: i32,
    pub contact_name: String,
    pub contact_phone: String,
    /// Requested table ids, in the order they should be checked.
    pub tables: Vec<Uuid>,
}

/// Mutable fields of an existing reservation.
#[derive(Debug, Clone)]
pub struct ReservationChanges {
    pub contact_name: String,
    pub contact_phone: String,
    pub guests: i32,
    pub status: Option<ReservationStatus>,
}

#[async_trait]
pub trait ReservationService: Send + Sync {
    /// Runs one admission attempt.
    ///
    /// On success the reservation and all of its table links are persisted
    /// together; on any `Err` nothing is written.
    async fn create_reservation(
        &self,
        request: NewReservation,
    ) -> Result<ReservationDetails, ReservationError>;

    /// Re-checks capacity against the linked tables and overwrites contacts,
    /// guest count and, if given, status. Availability is not re-checked.
    async fn update_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
        changes: ReservationChanges,
    ) -> Result<ReservationDetails, ReservationError>;

    /// Flips the status to canceled and nothing else.
    async fn cancel_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationDetails, ReservationError>;

    /// Returns `Err` if the reservation does not exist or belongs to another user.
    async fn get_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationDetails, ReservationError>;

    async fn list_user_reservations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, ReservationError>;

    /// Reservations of the user starting on the given UTC day.
    async fn list_user_reservations_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ReservationDetails>, ReservationError>;

    /// All reservations starting on the given UTC day.
    async fn list_reservations_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ReservationDetails>, ReservationError>;

    /// Every table of the restaurant, flagged free or occupied at `at`.
    async fn tables_with_availability(
        &self,
        restaurant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<TableAvailability>, ReservationError>;
}

/// Verifies signed login payloads.
pub trait LoginVerifier: Send + Sync {
    /// Returns `Ok(false)` when the payload is well formed but the signature
    /// does not match, and `Err` when fields are missing or stale.
    fn validate_signed_login(
        &self,
        signature: &str,
        fields: &HashMap<String, String>,
    ) -> Result<bool, AuthError>;
}

/// Issues and checks session tokens.
pub trait TokenService: Send + Sync {
    fn generate_token(&self, display_name: &str, user_id: Uuid) -> Result<String, AuthError>;

    /// Returns the user id the token was issued for.
    fn validate_token(&self, token: &str) -> Result<Uuid, AuthError>;
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Verifies a signed login, creating the user on first login, and issues a
    /// session token.
    async fn authenticate(
        &self,
        fields: HashMap<String, String>,
    ) -> Result<(User, String), AuthError>;

    async fn get_user(&self, user_id: Uuid) -> Result<User, AuthError>;

    async fn update_user(
        &self,
        user_id: Uuid,
        name: String,
        phone: Option<String>,
    ) -> Result<User, AuthError>;
}
