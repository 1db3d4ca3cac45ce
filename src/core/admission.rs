//! Admission rules for new reservations.
//!
//! An admission attempt moves through validation, capacity checking and
//! availability checking before the reservation is persisted. Every check
//! here is an early rejection; the storage-level exclusion trigger remains
//! the final arbiter for overlapping windows.

use crate::core::domain::Table;
use crate::core::error::ReservationError;
use crate::infrastructure::traits::TableRepository;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::{debug, info};
use uuid::Uuid;

/// Longest window a single reservation may cover, in seconds.
pub const MAX_RESERVATION_WINDOW_SECS: i64 = 2 * 60 * 60;

/// Upper bound on distinct tables linked to one reservation.
pub const MAX_TABLES_PER_RESERVATION: usize = 4;

/// Requested reservation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Window { start, end }
    }

    /// Half-open overlap: windows that only touch do not conflict.
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Checks the requested timestamps against `now` and returns the window
    /// as it is stored, truncated to whole seconds.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Window, ReservationError> {
        if self.start < now {
            return Err(ReservationError::validation(
                "start time must not be in the past",
            ));
        }
        if self.end - self.start > Duration::seconds(MAX_RESERVATION_WINDOW_SECS) {
            return Err(ReservationError::validation(
                "reservation window must not exceed 2 hours",
            ));
        }

        let stored = Window {
            start: self.start.trunc_subsecs(0),
            end: self.end.trunc_subsecs(0),
        };
        if stored.end <= stored.start {
            return Err(ReservationError::validation(
                "end time must be after start time",
            ));
        }
        Ok(stored)
    }
}

/// Collapses duplicate ids, keeping the caller's order, and enforces the
/// 1..=4 table bound.
pub fn distinct_tables(table_ids: &[Uuid]) -> Result<Vec<Uuid>, ReservationError> {
    let mut distinct: Vec<Uuid> = Vec::with_capacity(table_ids.len());
    for id in table_ids {
        if !distinct.contains(id) {
            distinct.push(*id);
        }
    }

    if distinct.is_empty() {
        return Err(ReservationError::validation(
            "at least one table must be requested",
        ));
    }
    if distinct.len() > MAX_TABLES_PER_RESERVATION {
        return Err(ReservationError::validation(format!(
            "too many tables: at most {MAX_TABLES_PER_RESERVATION} per reservation"
        )));
    }
    Ok(distinct)
}

pub fn validate_guests(guests: i32) -> Result<(), ReservationError> {
    if guests <= 0 {
        return Err(ReservationError::validation(
            "guest count must be positive",
        ));
    }
    Ok(())
}

/// Sums seating capacity of already resolved tables and compares it to the
/// requested guest count. The bound is inclusive.
pub fn check_capacity(tables: &[Table], guests: i32) -> Result<i64, ReservationError> {
    let available: i64 = tables.iter().map(|t| i64::from(t.capacity)).sum();
    debug!("{} tables seat {available}, {guests} requested", tables.len());

    if i64::from(guests) > available {
        return Err(ReservationError::CapacityExceeded {
            requested: guests,
            available,
        });
    }
    Ok(available)
}

/// Re-fetches every table by id, so capacity never comes from the caller,
/// then checks capacity. Fails fast on the first unknown id.
pub async fn resolve_and_check_capacity(
    tables: &dyn TableRepository,
    restaurant_id: Uuid,
    table_ids: &[Uuid],
    guests: i32,
) -> Result<(i64, Vec<Table>), ReservationError> {
    let mut resolved = Vec::with_capacity(table_ids.len());
    for &table_id in table_ids {
        let table = tables
            .get_table(table_id)
            .await?
            .ok_or_else(|| ReservationError::NotFound(format!("table {table_id}")))?;

        if table.restaurant_id != restaurant_id {
            return Err(ReservationError::validation(format!(
                "table {table_id} does not belong to restaurant {restaurant_id}"
            )));
        }
        resolved.push(table);
    }

    let available = check_capacity(&resolved, guests)?;
    Ok((available, resolved))
}

/// Checks each table in order and stops at the first one that is taken.
pub async fn ensure_available(
    tables: &dyn TableRepository,
    table_ids: &[Uuid],
    window: Window,
) -> Result<(), ReservationError> {
    for &table_id in table_ids {
        if !tables
            .is_table_available(table_id, window.start, window.end)
            .await?
        {
            info!("table {table_id} is busy between {} and {}", window.start, window.end);
            return Err(ReservationError::TableUnavailable(table_id));
        }
    }
    Ok(())
}
