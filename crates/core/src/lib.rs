//! Storefront
//!
//! Pure storefront algorithms: relevance scoring, ranked product search, the order
//! status state machine and minor-unit money arithmetic. Nothing here performs I/O.

pub mod orders;
pub mod pricing;
pub mod search;
pub mod similarity;

pub use orders::{InvalidTransition, OrderStatus, UnknownStatus};
pub use search::{Ranked, SearchOptions, Searchable};
