//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use storefront::OrderStatus;
use tracing::debug;

use crate::{
    database::{try_get_amount, try_get_timestamp, try_i64_from_u64},
    domain::{
        orders::records::{OrderId, OrderRecord, ProductSummary, TopSellingProduct},
        products::ProductId,
        users::UserId,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");
const LIST_ORDERS_SQL: &str = include_str!("../sql/list_orders.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("../sql/list_user_orders.sql");
const SALES_SUMMARY_SQL: &str = include_str!("../sql/sales_summary.sql");
const TOP_SELLING_PRODUCTS_SQL: &str = include_str!("../sql/top_selling_products.sql");

/// Order count and summed totals over a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SalesSummary {
    pub(crate) order_count: u64,
    pub(crate) total_sales: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
        total: u64,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(user.get())
            .bind(try_i64_from_u64(total, "total")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.get())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Like [`Self::find_order`], holding the row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        debug!(order = %order, "locking order row");

        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.get())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.get())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
            .bind(user.get())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn sales_summary(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<SalesSummary, sqlx::Error> {
        let row = sqlx::query(SALES_SUMMARY_SQL)
            .bind(SqlxTimestamp::from(start))
            .bind(SqlxTimestamp::from(end))
            .fetch_one(&mut **tx)
            .await?;

        Ok(SalesSummary {
            order_count: try_get_amount(&row, "order_count")?,
            total_sales: try_get_amount(&row, "total_sales")?,
        })
    }

    pub(crate) async fn top_selling_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        start: Timestamp,
        end: Timestamp,
        limit: u32,
    ) -> Result<Vec<TopSellingProduct>, sqlx::Error> {
        query_as::<Postgres, TopSellingProduct>(TOP_SELLING_PRODUCTS_SQL)
            .bind(SqlxTimestamp::from(start))
            .bind(SqlxTimestamp::from(end))
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }
}

fn try_get_status(row: &PgRow, col: &str) -> Result<OrderStatus, sqlx::Error> {
    let status: String = row.try_get(col)?;

    status.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: OrderId::new(row.try_get("id")?),
            user: UserId::new(row.try_get("user_id")?),
            total: try_get_amount(row, "total")?,
            status: try_get_status(row, "status")?,
            items: Vec::new(),
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TopSellingProduct {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product: ProductSummary {
                id: ProductId::new(row.try_get("product_id")?),
                name: row.try_get("product_name")?,
                category: row.try_get("product_category")?,
            },
            quantity_sold: try_get_amount(row, "quantity_sold")?,
            revenue: try_get_amount(row, "revenue")?,
        })
    }
}
