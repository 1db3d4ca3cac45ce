//! Store errors

use thiserror::Error;
use uuid::Uuid;

/// Message raised by the `reservation_tables_no_overlap` trigger.
pub(crate) const TABLE_UNAVAILABLE_TRIGGER: &str = "table_unavailable";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The exclusion trigger refused a link row because the table is already
    /// booked for an overlapping window.
    #[error("table {0} is already reserved for an overlapping window")]
    TableUnavailable(Uuid),
}

impl StoreError {
    /// Maps a failed link insert to [`StoreError::TableUnavailable`] when the
    /// exclusion trigger fired, otherwise keeps the database error.
    pub(crate) fn from_link_insert(error: sqlx::Error, table_id: Uuid) -> StoreError {
        match &error {
            sqlx::Error::Database(db_error)
                if db_error.message().contains(TABLE_UNAVAILABLE_TRIGGER) =>
            {
                StoreError::TableUnavailable(table_id)
            }
            _ => StoreError::Database(error),
        }
    }
}
