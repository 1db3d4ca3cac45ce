//! Errors surfaced by the core services

use crate::infrastructure::error::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReservationError {
    /// Malformed request, rejected before the store is consulted.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("capacity exceeded: {requested} guests requested, tables seat {available}")]
    CapacityExceeded { requested: i32, available: i64 },

    #[error("table {0} is not available")]
    TableUnavailable(Uuid),

    #[error("reservation belongs to another user")]
    Forbidden,

    #[error(transparent)]
    Store(StoreError),
}

impl ReservationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ReservationError::Validation(message.into())
    }
}

impl From<StoreError> for ReservationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::TableUnavailable(table_id) => ReservationError::TableUnavailable(table_id),
            error => ReservationError::Store(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    #[error("invalid auth_date: {0}")]
    InvalidAuthDate(String),

    #[error("auth_date is too old")]
    Stale,

    #[error("login signature is invalid")]
    InvalidSignature,

    #[error("invalid or expired token")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}
