//! Storefront persistence, services and application wiring.

pub mod context;
pub mod database;
pub mod domain;

#[cfg(test)]
mod test;

mod ids;

pub use ids::TypedId;
