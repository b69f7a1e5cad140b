//! Carts service errors.

use storefront::pricing::AmountOverflow;
use thiserror::Error;

use crate::domain::{
    carts::store::CartStoreError,
    errors::ErrorKind,
    products::{ProductId, ProductsServiceError},
    users::UserId,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("invalid product id {0}")]
    InvalidProduct(ProductId),

    #[error("cart for user {0} not found")]
    CartNotFound(UserId),

    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u64,
        available: u64,
    },

    #[error("cart total overflow")]
    Overflow(#[from] AmountOverflow),

    #[error("catalog error")]
    Products(#[source] ProductsServiceError),

    #[error("cart storage error")]
    Store(#[from] CartStoreError),
}

impl CartsServiceError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity | Self::InvalidProduct(_) | Self::Overflow(_) => {
                ErrorKind::InvalidInput
            }
            Self::CartNotFound(_) | Self::ItemNotFound(_) | Self::ProductNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Products(error) => error.kind(),
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<ProductsServiceError> for CartsServiceError {
    fn from(error: ProductsServiceError) -> Self {
        match error {
            ProductsServiceError::NotFound(product) => Self::ProductNotFound(product),
            other => Self::Products(other),
        }
    }
}
