//! Orders Data

use crate::domain::{products::ProductId, users::UserId};

/// Number of top sellers included in a report when no limit is given.
pub const DEFAULT_TOP_SELLERS: u32 = 5;

/// New Order Item Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product: ProductId,
    pub quantity: u32,
}

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user: UserId,
    pub items: Vec<NewOrderItem>,
}
