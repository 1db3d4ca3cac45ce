//! Implementations for the service the app needs.
//!

use crate::core::admission::{
    Window, check_capacity, distinct_tables, ensure_available, resolve_and_check_capacity,
    validate_guests,
};
use crate::core::domain::{
    Contacts, Reservation, ReservationDetails, ReservationStatus, ReservationTable,
    TableAvailability, User,
};
use crate::core::error::{AuthError, ReservationError};
use crate::core::traits::{
    LoginVerifier, NewReservation, ReservationChanges, ReservationService, TokenService,
    UserService,
};
use crate::infrastructure::traits::{ReservationRepository, TableRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SubsecRound, Utc};
use di::{Ref, injectable};
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// `[00:00, next 00:00)` of a UTC calendar day.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = date.and_time(NaiveTime::MIN).and_utc();
    (from, from + Duration::days(1))
}

#[injectable(ReservationService)]
pub struct MyReservationService {
    tables: Ref<dyn TableRepository>,
    reservations: Ref<dyn ReservationRepository>,
}

impl MyReservationService {
    pub fn new(
        tables: Ref<dyn TableRepository>,
        reservations: Ref<dyn ReservationRepository>,
    ) -> Self {
        Self {
            tables,
            reservations,
        }
    }

    async fn admit(&self, request: NewReservation) -> Result<ReservationDetails, ReservationError> {
        let window = Window::new(request.start_time, request.end_time).validate(Utc::now())?;
        let table_ids = distinct_tables(&request.tables)?;
        validate_guests(request.guests)?;

        if self
            .tables
            .get_restaurant(request.restaurant_id)
            .await?
            .is_none()
        {
            return Err(ReservationError::NotFound(format!(
                "restaurant {}",
                request.restaurant_id
            )));
        }

        let (available, tables) = resolve_and_check_capacity(
            &*self.tables,
            request.restaurant_id,
            &table_ids,
            request.guests,
        )
        .await?;

        ensure_available(&*self.tables, &table_ids, window).await?;

        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            restaurant_id: request.restaurant_id,
            start_time: window.start,
            end_time: window.end,
            status: ReservationStatus::Wait,
            capacity: request.guests,
            contacts: Contacts {
                name: request.contact_name,
                phone: request.contact_phone,
            },
        };
        let links: Vec<ReservationTable> = table_ids
            .iter()
            .map(|&table_id| ReservationTable {
                id: Uuid::new_v4(),
                reservation_id: reservation.id,
                table_id,
            })
            .collect();

        self.reservations
            .create_reservation(&reservation, &links)
            .await?;

        info!(
            "reservation {} admitted: {} guests on {} tables seating {available}",
            reservation.id,
            reservation.capacity,
            tables.len()
        );

        Ok(ReservationDetails {
            reservation,
            tables,
        })
    }

    /// Loads a reservation and makes sure it belongs to `user_id`.
    async fn owned(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Reservation, ReservationError> {
        let reservation = self
            .reservations
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| ReservationError::NotFound(format!("reservation {reservation_id}")))?;

        if reservation.user_id != user_id {
            warn!("user {user_id} tried to access reservation {reservation_id}");
            return Err(ReservationError::Forbidden);
        }
        Ok(reservation)
    }

    async fn with_tables(
        &self,
        reservation: Reservation,
    ) -> Result<ReservationDetails, ReservationError> {
        let tables = self.tables.tables_for_reservation(reservation.id).await?;
        Ok(ReservationDetails {
            reservation,
            tables,
        })
    }

    async fn all_with_tables(
        &self,
        reservations: Vec<Reservation>,
    ) -> Result<Vec<ReservationDetails>, ReservationError> {
        let mut details = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            details.push(self.with_tables(reservation).await?);
        }
        Ok(details)
    }

    async fn save(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        if !self.reservations.update_reservation(reservation).await? {
            return Err(ReservationError::NotFound(format!(
                "reservation {}",
                reservation.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationService for MyReservationService {
    async fn create_reservation(
        &self,
        request: NewReservation,
    ) -> Result<ReservationDetails, ReservationError> {
        let user_id = request.user_id;
        let result = self.admit(request).await;

        match &result {
            Err(ReservationError::Store(e)) => error!("admission for user {user_id} failed: {e}"),
            Err(e) => info!("admission for user {user_id} rejected: {e}"),
            Ok(_) => {}
        }
        result
    }

    async fn update_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
        changes: ReservationChanges,
    ) -> Result<ReservationDetails, ReservationError> {
        let mut reservation = self.owned(user_id, reservation_id).await?;
        if reservation.status == ReservationStatus::Canceled {
            return Err(ReservationError::validation("reservation is canceled"));
        }
        validate_guests(changes.guests)?;

        let tables = self.tables.tables_for_reservation(reservation_id).await?;
        check_capacity(&tables, changes.guests)?;

        reservation.contacts = Contacts {
            name: changes.contact_name,
            phone: changes.contact_phone,
        };
        reservation.capacity = changes.guests;
        if let Some(status) = changes.status {
            reservation.status = status;
        }
        self.save(&reservation).await?;

        info!("reservation {reservation_id} updated");
        Ok(ReservationDetails {
            reservation,
            tables,
        })
    }

    async fn cancel_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationDetails, ReservationError> {
        let mut reservation = self.owned(user_id, reservation_id).await?;
        if reservation.status != ReservationStatus::Canceled {
            reservation.status = ReservationStatus::Canceled;
            self.save(&reservation).await?;
            info!("reservation {reservation_id} canceled");
        }
        self.with_tables(reservation).await
    }

    async fn get_reservation(
        &self,
        user_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationDetails, ReservationError> {
        let reservation = self.owned(user_id, reservation_id).await?;
        self.with_tables(reservation).await
    }

    async fn list_user_reservations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, ReservationError> {
        let reservations = self.reservations.list_for_user(user_id).await?;
        self.all_with_tables(reservations).await
    }

    async fn list_user_reservations_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ReservationDetails>, ReservationError> {
        let (from, to) = day_bounds(date);
        let reservations = self
            .reservations
            .list_for_user_between(user_id, from, to)
            .await?;
        self.all_with_tables(reservations).await
    }

    async fn list_reservations_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ReservationDetails>, ReservationError> {
        let (from, to) = day_bounds(date);
        let reservations = self.reservations.list_between(from, to).await?;
        self.all_with_tables(reservations).await
    }

    async fn tables_with_availability(
        &self,
        restaurant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<TableAvailability>, ReservationError> {
        let at = at.trunc_subsecs(0);
        if self.tables.get_restaurant(restaurant_id).await?.is_none() {
            return Err(ReservationError::NotFound(format!(
                "restaurant {restaurant_id}"
            )));
        }

        let occupied: HashSet<Uuid> = self
            .tables
            .occupied_tables_at(restaurant_id, at)
            .await?
            .into_iter()
            .collect();

        Ok(self
            .tables
            .tables_for_restaurant(restaurant_id)
            .await?
            .into_iter()
            .map(|table| TableAvailability {
                is_available: !occupied.contains(&table.id),
                table,
            })
            .collect())
    }
}

#[injectable(UserService)]
pub struct MyUserService {
    users: Ref<dyn UserRepository>,
    verifier: Ref<dyn LoginVerifier>,
    tokens: Ref<dyn TokenService>,
}

impl MyUserService {
    pub fn new(
        users: Ref<dyn UserRepository>,
        verifier: Ref<dyn LoginVerifier>,
        tokens: Ref<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
        }
    }

    async fn find_or_create(&self, telegram_id: i64, name: String) -> Result<User, AuthError> {
        if let Some(user) = self.users.find_by_telegram_id(telegram_id).await? {
            return Ok(user);
        }

        let new_user = User {
            id: Uuid::new_v4(),
            name,
            telegram_id,
            phone: None,
        };
        match self.users.create_user(&new_user).await {
            Ok(user) => {
                info!("user {} created for telegram id {telegram_id}", user.id);
                Ok(user)
            }
            // A concurrent first login may have inserted the same telegram id.
            Err(e) => match self.users.find_by_telegram_id(telegram_id).await? {
                Some(user) => Ok(user),
                None => Err(e.into()),
            },
        }
    }
}

#[async_trait]
impl UserService for MyUserService {
    async fn authenticate(
        &self,
        fields: HashMap<String, String>,
    ) -> Result<(User, String), AuthError> {
        let signature = fields
            .get("hash")
            .cloned()
            .ok_or(AuthError::MissingField("hash"))?;

        if !self.verifier.validate_signed_login(&signature, &fields)? {
            warn!("signed login rejected: hash mismatch");
            return Err(AuthError::InvalidSignature);
        }

        let telegram_id: i64 = fields
            .get("id")
            .ok_or(AuthError::MissingField("id"))?
            .parse()
            .map_err(|_| AuthError::InvalidField("id"))?;
        let name = match fields.get("first_name").filter(|name| !name.is_empty()) {
            Some(name) => name.clone(),
            None => fields.get("username").cloned().unwrap_or_default(),
        };

        let user = self.find_or_create(telegram_id, name).await?;
        let token = self.tokens.generate_token(&user.name, user.id)?;

        Ok((user, token))
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        name: String,
        phone: Option<String>,
    ) -> Result<User, AuthError> {
        let mut user = self.get_user(user_id).await?;
        user.name = name;
        user.phone = phone;

        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound);
        }
        Ok(user)
    }
}
