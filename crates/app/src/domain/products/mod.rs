//! Products

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub(crate) use repository::PgProductsRepository;

pub use errors::ProductsServiceError;
pub use records::{ProductId, ProductRecord};
pub use service::*;
