//! Order Records

use jiff::Timestamp;
use serde::{Serialize, Serializer};
use storefront::OrderStatus;

use crate::{
    domain::{products::ProductId, users::UserId},
    ids::TypedId,
};

/// Order Id
pub type OrderId = TypedId<OrderRecord>;

/// Order Item Id
pub type OrderItemId = TypedId<OrderItemRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user: UserId,

    /// Fixed when the order is placed.
    pub total: u64,

    #[serde(serialize_with = "serialize_status")]
    pub status: OrderStatus,

    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Whether `user` placed this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user == user
    }
}

/// Order line, priced at the time the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemRecord {
    pub id: OrderItemId,
    pub order: OrderId,
    pub product: ProductSummary,
    pub quantity: u32,
    pub price: u64,
    pub subtotal: u64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopSellingProduct {
    pub product: ProductSummary,
    pub quantity_sold: u64,
    pub revenue: u64,
}

/// Sales over an inclusive time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub start: Timestamp,
    pub end: Timestamp,
    pub total_sales: u64,
    pub order_count: u64,

    /// `total_sales / order_count`, rounded to a whole minor unit.
    pub average_order_value: u64,

    pub top_products: Vec<TopSellingProduct>,
}

fn serialize_status<S: Serializer>(status: &OrderStatus, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}
