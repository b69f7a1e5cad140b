//! Orders service errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as DbErrorKind},
};
use storefront::{InvalidTransition, UnknownStatus, pricing::AmountOverflow};
use thiserror::Error;

use crate::domain::{
    errors::ErrorKind,
    orders::records::OrderId,
    products::ProductId,
    users::UserId,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("quantity for product {0} must be at least 1")]
    InvalidQuantity(ProductId),

    #[error("invalid user id {0}")]
    InvalidUser(UserId),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u64,
        available: u64,
    },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("order total overflow")]
    Overflow(#[from] AmountOverflow),

    #[error("order references a missing record")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("invalid amount value")]
    InvalidAmount(#[from] TryFromIntError),
}

impl OrdersServiceError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOrder
            | Self::InvalidQuantity(_)
            | Self::InvalidUser(_)
            | Self::UnknownStatus(_)
            | Self::Overflow(_)
            | Self::MissingRequiredData
            | Self::InvalidData
            | Self::InvalidAmount(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::InvalidReference => ErrorKind::Conflict,
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(DbErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(DbErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(DbErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
