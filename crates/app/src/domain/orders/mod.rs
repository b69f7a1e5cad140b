//! Orders

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod service;

pub use errors::OrdersServiceError;
pub use records::{OrderId, OrderRecord};
pub use service::*;
