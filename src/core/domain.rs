//! Domain model shared by the engine, the repositories and the api layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub telegram_id: i64,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Position of a table on the floor plan. Not used for admission.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub number: i32,
    pub capacity: i32,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ReservationStatus {
    Wait = 1,
    #[serde(alias = "confirmed")]
    Success = 2,
    #[serde(alias = "cancelled")]
    Canceled = 3,
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wait" => Ok(ReservationStatus::Wait),
            "success" | "confirmed" => Ok(ReservationStatus::Success),
            "canceled" | "cancelled" => Ok(ReservationStatus::Canceled),
            _ => Err(format!("invalid status: {s}")),
        }
    }
}

/// Contact snapshot taken at booking time, independent of the user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Requested guest count.
    pub capacity: i32,
    pub contacts: Contacts,
}

/// A reservation together with the tables linked to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub tables: Vec<Table>,
}

/// Link row tying a reservation to one of its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationTable {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub table_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableAvailability {
    pub table: Table,
    pub is_available: bool,
}
