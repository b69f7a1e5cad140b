//! Checkout errors.

use thiserror::Error;

use crate::domain::{
    carts::CartsServiceError, errors::ErrorKind, orders::OrdersServiceError, users::UserId,
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart for user {0} is empty")]
    EmptyCart(UserId),

    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),
}

impl CheckoutError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCart(_) => ErrorKind::InvalidInput,
            Self::Carts(error) => error.kind(),
            Self::Orders(error) => error.kind(),
        }
    }
}
