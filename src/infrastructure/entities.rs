//! Database entities

use crate::core::domain;
use crate::core::domain::ReservationStatus;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub telegram_id: i64,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, FromRow)]
pub struct Table {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
}

#[derive(Debug, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub capacity: i32,
    pub contact_name: String,
    pub contact_phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct ReservationTable {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub table_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<User> for domain::User {
    fn from(user: User) -> Self {
        domain::User {
            id: user.id,
            name: user.name,
            telegram_id: user.telegram_id,
            phone: user.phone,
        }
    }
}

impl From<Restaurant> for domain::Restaurant {
    fn from(restaurant: Restaurant) -> Self {
        domain::Restaurant {
            id: restaurant.id,
            name: restaurant.name,
            address: restaurant.address,
            phone: restaurant.phone,
        }
    }
}

impl From<Table> for domain::Table {
    fn from(table: Table) -> Self {
        domain::Table {
            id: table.id,
            restaurant_id: table.restaurant_id,
            number: table.table_number,
            capacity: table.capacity,
            position: domain::Position {
                x: table.position_x,
                y: table.position_y,
                z: table.position_z,
            },
        }
    }
}

impl From<Reservation> for domain::Reservation {
    fn from(reservation: Reservation) -> Self {
        domain::Reservation {
            id: reservation.id,
            user_id: reservation.user_id,
            restaurant_id: reservation.restaurant_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            status: reservation.status,
            capacity: reservation.capacity,
            contacts: domain::Contacts {
                name: reservation.contact_name,
                phone: reservation.contact_phone,
            },
        }
    }
}

impl From<ReservationTable> for domain::ReservationTable {
    fn from(link: ReservationTable) -> Self {
        domain::ReservationTable {
            id: link.id,
            reservation_id: link.reservation_id,
            table_id: link.table_id,
        }
    }
}
