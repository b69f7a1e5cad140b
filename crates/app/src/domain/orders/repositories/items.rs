//! Order Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::{
        try_get_amount, try_get_quantity, try_get_timestamp, try_i32_from_u32, try_i64_from_u64,
    },
    domain::{
        orders::records::{OrderId, OrderItemId, OrderItemRecord, ProductSummary},
        products::ProductId,
    },
};

const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");

/// A priced line ready to be written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PricedLine {
    pub(crate) product: ProductId,
    pub(crate) quantity: u32,
    pub(crate) price: u64,
    pub(crate) subtotal: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderId,
        line: PricedLine,
    ) -> Result<OrderItemId, sqlx::Error> {
        let id = query_scalar::<Postgres, i64>(CREATE_ORDER_ITEM_SQL)
            .bind(order.get())
            .bind(line.product.get())
            .bind(try_i32_from_u32(line.quantity, "quantity")?)
            .bind(try_i64_from_u64(line.price, "price")?)
            .bind(try_i64_from_u64(line.subtotal, "subtotal")?)
            .fetch_one(&mut **tx)
            .await?;

        Ok(OrderItemId::new(id))
    }

    /// Items of every given order, grouped by order then in insertion order.
    pub(crate) async fn items_for_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderId],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let ids: Vec<i64> = orders.iter().map(|order| order.get()).collect();

        query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: OrderItemId::new(row.try_get("id")?),
            order: OrderId::new(row.try_get("order_id")?),
            product: ProductSummary {
                id: ProductId::new(row.try_get("product_id")?),
                name: row.try_get("product_name")?,
                category: row.try_get("product_category")?,
            },
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_amount(row, "price")?,
            subtotal: try_get_amount(row, "subtotal")?,
            created_at: try_get_timestamp(row, "created_at")?,
        })
    }
}
