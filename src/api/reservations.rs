//! Reservation endpoints

use crate::api::reservations::schemas::{
    BookedSlotList, CreateReservation, ReservationList, TableAvailabilityList, UpdateReservation,
};
use crate::api::{ApiError, ExtractUser};
use crate::core::domain::ReservationStatus;
use crate::core::traits::{NewReservation, ReservationService};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/booking/me", get(my_reservations))
        .route("/booking/me/:date", get(my_reservations_on))
        .route(
            "/booking/:id",
            get(get_reservation).patch(update_reservation),
        )
        .route("/booking/:id/:status", patch(update_reservation_status))
        .route("/bookings/:date", get(reservations_on))
        .route(
            "/restaurants/:restaurant_id/booking",
            post(create_reservation),
        )
        .route(
            "/restaurants/:restaurant_id/tables/:at",
            get(tables_with_availability),
        )
}

fn parse_date(date: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid date {date:?}, expected YYYY-MM-DD")))
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_instant(at: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(at) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| ApiError::bad_request(format!("invalid date time {at:?}")))
}

async fn create_reservation(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
    Path(restaurant_id): Path<Uuid>,
    Json(request): Json<CreateReservation>,
) -> Result<(StatusCode, Json<schemas::Reservation>), ApiError> {
    let reservation = reservation_service
        .create_reservation(NewReservation {
            user_id: current_user,
            restaurant_id,
            start_time: request.date_start,
            end_time: request.date_end,
            guests: request.capacity,
            contact_name: request.contacts.name,
            contact_phone: request.contacts.phone,
            tables: request.tables,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

async fn get_reservation(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<(StatusCode, Json<schemas::Reservation>), ApiError> {
    let reservation = reservation_service
        .get_reservation(current_user, reservation_id)
        .await?;

    Ok((StatusCode::OK, Json(reservation.into())))
}

async fn update_reservation(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
    Path(reservation_id): Path<Uuid>,
    Json(update): Json<UpdateReservation>,
) -> Result<(StatusCode, Json<schemas::Reservation>), ApiError> {
    let reservation = reservation_service
        .update_reservation(current_user, reservation_id, update.into_changes(None))
        .await?;

    Ok((StatusCode::OK, Json(reservation.into())))
}

/// `canceled` only flips the status; any other status needs the usual body.
async fn update_reservation_status(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
    Path((reservation_id, status)): Path<(Uuid, String)>,
    update: Option<Json<UpdateReservation>>,
) -> Result<(StatusCode, Json<schemas::Reservation>), ApiError> {
    let status: ReservationStatus = status.parse().map_err(ApiError::bad_request)?;

    let reservation = if status == ReservationStatus::Canceled {
        reservation_service
            .cancel_reservation(current_user, reservation_id)
            .await?
    } else {
        let Some(Json(update)) = update else {
            return Err(ApiError::bad_request("request body is missing"));
        };
        reservation_service
            .update_reservation(
                current_user,
                reservation_id,
                update.into_changes(Some(status)),
            )
            .await?
    };

    Ok((StatusCode::OK, Json(reservation.into())))
}

async fn my_reservations(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<(StatusCode, Json<ReservationList>), ApiError> {
    let reservations = reservation_service
        .list_user_reservations(current_user)
        .await?;

    Ok((StatusCode::OK, Json(reservations.into())))
}

async fn my_reservations_on(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(current_user): ExtractUser,
    Path(date): Path<String>,
) -> Result<(StatusCode, Json<ReservationList>), ApiError> {
    let date = parse_date(&date)?;
    let reservations = reservation_service
        .list_user_reservations_on(current_user, date)
        .await?;

    Ok((StatusCode::OK, Json(reservations.into())))
}

/// Occupancy of every restaurant on a day. Owners and contacts are not exposed.
async fn reservations_on(
    Inject(reservation_service): Inject<dyn ReservationService>,
    ExtractUser(_current_user): ExtractUser,
    Path(date): Path<String>,
) -> Result<(StatusCode, Json<BookedSlotList>), ApiError> {
    let date = parse_date(&date)?;
    let reservations = reservation_service.list_reservations_on(date).await?;

    Ok((
        StatusCode::OK,
        Json(BookedSlotList {
            reservations: reservations
                .into_iter()
                .map(schemas::BookedSlot::from)
                .collect(),
        }),
    ))
}

async fn tables_with_availability(
    Inject(reservation_service): Inject<dyn ReservationService>,
    Path((restaurant_id, at)): Path<(Uuid, String)>,
) -> Result<(StatusCode, Json<TableAvailabilityList>), ApiError> {
    let at = parse_instant(&at)?;
    let tables = reservation_service
        .tables_with_availability(restaurant_id, at)
        .await?;

    Ok((
        StatusCode::OK,
        Json(TableAvailabilityList {
            tables: tables
                .into_iter()
                .map(schemas::TableWithAvailability::from)
                .collect(),
        }),
    ))
}

pub mod schemas {
    use crate::core::domain;
    use crate::core::domain::ReservationStatus;
    use crate::core::traits::ReservationChanges;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct Contacts {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub phone: String,
    }

    impl From<domain::Contacts> for Contacts {
        fn from(contacts: domain::Contacts) -> Self {
            Contacts {
                name: contacts.name,
                phone: contacts.phone,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateReservation {
        pub date_start: DateTime<Utc>,
        pub date_end: DateTime<Utc>,
        /// Guest count.
        pub capacity: i32,
        #[serde(default)]
        pub contacts: Contacts,
        /// Table ids; only ids are read, capacities are looked up server side.
        #[serde(alias = "table")]
        pub tables: Vec<Uuid>,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateReservation {
        #[serde(default)]
        pub contacts: Contacts,
        pub capacity: i32,
    }

    impl UpdateReservation {
        pub fn into_changes(self, status: Option<ReservationStatus>) -> ReservationChanges {
            ReservationChanges {
                contact_name: self.contacts.name,
                contact_phone: self.contacts.phone,
                guests: self.capacity,
                status,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Table {
        pub id: Uuid,
        pub restaurant_id: Uuid,
        pub table_number: i32,
        pub capacity: i32,
        pub position_x: f64,
        pub position_y: f64,
        pub position_z: f64,
    }

    impl From<domain::Table> for Table {
        fn from(table: domain::Table) -> Self {
            Table {
                id: table.id,
                restaurant_id: table.restaurant_id,
                table_number: table.number,
                capacity: table.capacity,
                position_x: table.position.x,
                position_y: table.position.y,
                position_z: table.position.z,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Reservation {
        pub id: Uuid,
        pub user_id: Uuid,
        pub restaurant_id: Uuid,
        pub start_time: DateTime<Utc>,
        pub end_time: DateTime<Utc>,
        pub status: ReservationStatus,
        pub capacity: i32,
        pub contacts: Contacts,
        pub tables: Vec<Table>,
    }

    impl From<domain::ReservationDetails> for Reservation {
        fn from(details: domain::ReservationDetails) -> Self {
            let reservation = details.reservation;
            Reservation {
                id: reservation.id,
                user_id: reservation.user_id,
                restaurant_id: reservation.restaurant_id,
                start_time: reservation.start_time,
                end_time: reservation.end_time,
                status: reservation.status,
                capacity: reservation.capacity,
                contacts: reservation.contacts.into(),
                tables: details.tables.into_iter().map(Table::from).collect(),
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ReservationList {
        pub reservations: Vec<Reservation>,
    }

    impl From<Vec<domain::ReservationDetails>> for ReservationList {
        fn from(reservations: Vec<domain::ReservationDetails>) -> Self {
            ReservationList {
                reservations: reservations.into_iter().map(Reservation::from).collect(),
            }
        }
    }

    /// A reservation as seen by someone who may not own it.
    #[derive(Serialize, Debug)]
    pub struct BookedSlot {
        pub restaurant_id: Uuid,
        pub start_time: DateTime<Utc>,
        pub end_time: DateTime<Utc>,
        pub status: ReservationStatus,
        pub tables: Vec<Table>,
    }

    impl From<domain::ReservationDetails> for BookedSlot {
        fn from(details: domain::ReservationDetails) -> Self {
            let reservation = details.reservation;
            BookedSlot {
                restaurant_id: reservation.restaurant_id,
                start_time: reservation.start_time,
                end_time: reservation.end_time,
                status: reservation.status,
                tables: details.tables.into_iter().map(Table::from).collect(),
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct BookedSlotList {
        pub reservations: Vec<BookedSlot>,
    }

    #[derive(Serialize, Debug)]
    pub struct TableWithAvailability {
        #[serde(flatten)]
        pub table: Table,
        pub is_available: bool,
    }

    impl From<domain::TableAvailability> for TableWithAvailability {
        fn from(availability: domain::TableAvailability) -> Self {
            TableWithAvailability {
                table: availability.table.into(),
                is_available: availability.is_available,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct TableAvailabilityList {
        pub tables: Vec<TableWithAvailability>,
    }
}
