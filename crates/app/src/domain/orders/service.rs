//! Orders service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use storefront::{OrderStatus, pricing};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            data::NewOrder,
            errors::OrdersServiceError,
            records::{OrderId, OrderItemRecord, OrderRecord, SalesReport, TopSellingProduct},
            repositories::{PgOrderItemsRepository, PgOrdersRepository, PricedLine},
        },
        products::{PgProductsRepository, ProductId, ProductRecord},
        users::UserId,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    products_repository: PgProductsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    /// Fill in `items` on each order.
    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut orders: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();

        let mut by_order: FxHashMap<OrderId, Vec<OrderItemRecord>> = FxHashMap::default();

        for item in self.items_repository.items_for_orders(tx, &ids).await? {
            by_order.entry(item.order).or_default().push(item);
        }

        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn load_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderId,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let found = self
            .orders_repository
            .find_order(tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound(order))?;

        self.attach_items(tx, vec![found])
            .await?
            .pop()
            .ok_or(OrdersServiceError::NotFound(order))
    }

    /// Lock the products behind `demand` and check each can cover its quantity.
    async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        demand: &BTreeMap<ProductId, u64>,
    ) -> Result<FxHashMap<ProductId, ProductRecord>, OrdersServiceError> {
        let ids: Vec<ProductId> = demand.keys().copied().collect();

        let locked: FxHashMap<ProductId, ProductRecord> = self
            .products_repository
            .lock_products(tx, &ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        for (&product, &requested) in demand {
            let record = locked
                .get(&product)
                .ok_or(OrdersServiceError::ProductNotFound(product))?;

            if record.stock < requested {
                return Err(OrdersServiceError::InsufficientStock {
                    product,
                    requested,
                    available: record.stock,
                });
            }
        }

        Ok(locked)
    }

    async fn top_sellers(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: u32,
    ) -> Result<Vec<TopSellingProduct>, sqlx::Error> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self
            .orders_repository
            .top_selling_products(&mut tx, start, end, limit)
            .await?;

        tx.commit().await?;

        Ok(products)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(user = %order.user, lines = order.items.len()),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        if !order.user.is_valid() {
            return Err(OrdersServiceError::InvalidUser(order.user));
        }

        let mut demand: BTreeMap<ProductId, u64> = BTreeMap::new();

        for item in &order.items {
            if item.quantity == 0 {
                return Err(OrdersServiceError::InvalidQuantity(item.product));
            }

            i32::try_from(item.quantity)?;

            *demand.entry(item.product).or_default() += u64::from(item.quantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let locked = self.reserve(&mut tx, &demand).await?;

        let mut lines = Vec::with_capacity(order.items.len());

        for item in &order.items {
            let price = locked
                .get(&item.product)
                .map(|product| product.price)
                .ok_or(OrdersServiceError::ProductNotFound(item.product))?;

            lines.push(PricedLine {
                product: item.product,
                quantity: item.quantity,
                price,
                subtotal: pricing::line_subtotal(price, item.quantity)?,
            });
        }

        let total = pricing::total(lines.iter().map(|line| (line.price, line.quantity)))?;

        i64::try_from(total)?;

        let created = self
            .orders_repository
            .create_order(&mut tx, order.user, total)
            .await?;

        for line in lines {
            self.items_repository
                .create_item(&mut tx, created.id, line)
                .await?;

            self.products_repository
                .adjust_stock(&mut tx, line.product, -i64::from(line.quantity))
                .await?
                .ok_or(OrdersServiceError::InsufficientStock {
                    product: line.product,
                    requested: u64::from(line.quantity),
                    available: 0,
                })?;
        }

        let loaded = self.load_order(&mut tx, created.id).await?;

        tx.commit().await?;

        info!(order = %loaded.id, total = loaded.total, "created order");

        Ok(loaded)
    }

    async fn get_order(&self, order: OrderId) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let loaded = self.load_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(loaded)
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders_repository.list_orders(&mut tx).await?;
        let orders = self.attach_items(&mut tx, orders).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn list_user_orders(&self, user: UserId) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders_repository.list_user_orders(&mut tx, user).await?;
        let orders = self.attach_items(&mut tx, orders).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.update_order_status",
        skip(self),
        fields(order = %order, status = %status),
        err
    )]
    async fn update_order_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self
            .orders_repository
            .lock_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound(order))?;

        let next = current.status.transition_to(status)?;

        if current.status.restores_stock(next) {
            let mut items = self
                .items_repository
                .items_for_orders(&mut tx, &[order])
                .await?;

            items.sort_by_key(|item| item.product.id);

            let products: Vec<ProductId> = items.iter().map(|item| item.product.id).collect();

            self.products_repository
                .lock_products(&mut tx, &products)
                .await?;

            for item in &items {
                self.products_repository
                    .adjust_stock(&mut tx, item.product.id, i64::from(item.quantity))
                    .await?
                    .ok_or(OrdersServiceError::ProductNotFound(item.product.id))?;
            }
        }

        self.orders_repository
            .update_status(&mut tx, order, next)
            .await?;

        let loaded = self.load_order(&mut tx, order).await?;

        tx.commit().await?;

        info!(from = %current.status, to = %next, "changed order status");

        Ok(loaded)
    }

    async fn cancel_order(&self, order: OrderId) -> Result<OrderRecord, OrdersServiceError> {
        self.update_order_status(order, OrderStatus::Cancelled).await
    }

    #[tracing::instrument(name = "orders.service.sales_report", skip(self), err)]
    async fn sales_report(
        &self,
        start: Timestamp,
        end: Timestamp,
        top_limit: u32,
    ) -> Result<SalesReport, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let summary = self
            .orders_repository
            .sales_summary(&mut tx, start, end)
            .await?;

        tx.commit().await?;

        let top_products = if summary.order_count == 0 {
            Vec::new()
        } else {
            match self.top_sellers(start, end, top_limit).await {
                Ok(products) => products,
                Err(error) => {
                    warn!(error = %error, "failed to aggregate top-selling products");

                    Vec::new()
                }
            }
        };

        Ok(SalesReport {
            start,
            end,
            total_sales: summary.total_sales,
            order_count: summary.order_count,
            average_order_value: pricing::average(summary.total_sales, summary.order_count),
            top_products,
        })
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order, reserving stock for every line atomically.
    ///
    /// Prices are read from the catalog while the product rows are locked. Nothing
    /// is written unless every line can be covered.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve an order with its items.
    async fn get_order(&self, order: OrderId) -> Result<OrderRecord, OrdersServiceError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// A user's orders, newest first.
    async fn list_user_orders(&self, user: UserId) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Move an order to `status`.
    ///
    /// Cancelling returns every line's quantity to stock in the same transaction.
    async fn update_order_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;

    async fn cancel_order(&self, order: OrderId) -> Result<OrderRecord, OrdersServiceError>;

    /// Sales between `start` and `end` inclusive, across every status.
    async fn sales_report(
        &self,
        start: Timestamp,
        end: Timestamp,
        top_limit: u32,
    ) -> Result<SalesReport, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::{
        domain::{
            errors::ErrorKind,
            orders::data::{DEFAULT_TOP_SELLERS, NewOrderItem},
            products::{ProductsService, ProductsServiceError, data::ProductUpdate},
        },
        test::{TestContext, helpers::new_product},
    };

    use super::*;

    const USER: UserId = UserId::new(1);

    fn line(product: ProductId, quantity: u32) -> NewOrderItem {
        NewOrderItem { product, quantity }
    }

    fn order(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder { user: USER, items }
    }

    fn around_now() -> Result<(Timestamp, Timestamp), jiff::Error> {
        let now = Timestamp::now();

        Ok((
            now.checked_sub(SignedDuration::from_hours(1))?,
            now.checked_add(SignedDuration::from_hours(1))?,
        ))
    }

    async fn stock_of(ctx: &TestContext, product: ProductId) -> Result<u64, ProductsServiceError> {
        Ok(ctx.products.get_product(product).await?.stock)
    }

    #[tokio::test]
    async fn create_order_prices_lines_and_decrements_stock() -> TestResult {
        let ctx = TestContext::new().await;

        let product = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(product.id, 2)]))
            .await?;

        assert_eq!(created.total, 39_98);
        assert_eq!(created.status, OrderStatus::Pending);
        assert!(created.is_owned_by(USER));
        assert_eq!(created.items.len(), 1);

        let item = created.items.first().ok_or("missing item")?;

        assert_eq!(item.product.name, "Desk Lamp");
        assert_eq!(item.price, 19_99);
        assert_eq!(item.subtotal, 39_98);
        assert_eq!(stock_of(&ctx, product.id).await?, 8);

        Ok(())
    }

    #[tokio::test]
    async fn order_total_is_sum_of_subtotals() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let mouse = ctx
            .products
            .create_product(new_product("Wireless Mouse", 24_99, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(mouse.id, 1), line(lamp.id, 3)]))
            .await?;

        let subtotals: u64 = created.items.iter().map(|item| item.subtotal).sum();

        assert_eq!(created.total, subtotals);
        assert_eq!(created.total, 24_99 + 3 * 19_99);

        Ok(())
    }

    #[tokio::test]
    async fn one_short_line_rolls_back_the_whole_order() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let desk = ctx
            .products
            .create_product(new_product("Standing Desk", 349_00, 1))
            .await?;

        let result = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 2), line(desk.id, 2)]))
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InsufficientStock { product, requested: 2, available: 1 })
                    if product == desk.id
            ),
            "expected InsufficientStock, got {result:?}"
        );

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(items, 0);
        assert_eq!(stock_of(&ctx, lamp.id).await?, 10);
        assert_eq!(stock_of(&ctx, desk.id).await?, 1);
        assert!(ctx.orders.list_orders().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_against_stock_together() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 3))
            .await?;

        let result = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 2), line(lamp.id, 2)]))
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InsufficientStock { requested: 4, available: 3, .. })
            ),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, lamp.id).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn missing_product_fails_without_writing() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 3))
            .await?;

        let missing = ProductId::new(lamp.id.get() + 100);

        let result = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 1), line(missing, 1)]))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::ProductNotFound(id)) if id == missing),
            "expected ProductNotFound, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, lamp.id).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn create_order_rejects_empty_and_zero_quantity() {
        let ctx = TestContext::new().await;

        let empty = ctx.orders.create_order(order(Vec::new())).await;
        let zero = ctx
            .orders
            .create_order(order(vec![line(ProductId::new(1), 0)]))
            .await;

        assert!(
            matches!(empty, Err(OrdersServiceError::EmptyOrder)),
            "expected EmptyOrder, got {empty:?}"
        );
        assert!(
            matches!(&zero, Err(error) if error.kind() == ErrorKind::InvalidInput),
            "expected invalid input, got {zero:?}"
        );
    }

    #[tokio::test]
    async fn quantity_beyond_storage_range_is_invalid_input() -> TestResult {
        let ctx = TestContext::new().await;

        let full = u64::try_from(i64::MAX)?;

        let bolts = ctx
            .products
            .create_product(new_product("Bolt", 1, full))
            .await?;

        let result = ctx
            .orders
            .create_order(order(vec![line(bolts.id, u32::MAX)]))
            .await;

        assert!(
            matches!(&result, Err(OrdersServiceError::InvalidAmount(_))),
            "expected InvalidAmount, got {result:?}"
        );
        assert!(
            matches!(&result, Err(error) if error.kind() == ErrorKind::InvalidInput),
            "expected invalid input, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, bolts.id).await?, full);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_orders_cannot_oversell() -> TestResult {
        let ctx = TestContext::new().await;

        let desk = ctx
            .products
            .create_product(new_product("Standing Desk", 349_00, 1))
            .await?;

        let (first, second) = tokio::join!(
            ctx.orders.create_order(order(vec![line(desk.id, 1)])),
            ctx.orders.create_order(order(vec![line(desk.id, 1)])),
        );

        assert_eq!(
            usize::from(first.is_ok()) + usize::from(second.is_ok()),
            1,
            "exactly one order should succeed"
        );
        assert_eq!(stock_of(&ctx, desk.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_restores_stock_once() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 4)]))
            .await?;

        assert_eq!(stock_of(&ctx, lamp.id).await?, 6);

        let cancelled = ctx.orders.cancel_order(created.id).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.total, created.total);
        assert_eq!(stock_of(&ctx, lamp.id).await?, 10);

        let again = ctx.orders.cancel_order(created.id).await;

        assert!(
            matches!(again, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {again:?}"
        );
        assert_eq!(stock_of(&ctx, lamp.id).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn order_keeps_prices_after_catalog_change() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 10_00, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 2)]))
            .await?;

        ctx.products
            .update_product(
                lamp.id,
                ProductUpdate {
                    price: Some(99_00),
                    ..ProductUpdate::default()
                },
            )
            .await?;

        let reloaded = ctx.orders.get_order(created.id).await?;
        let item = reloaded.items.first().ok_or("missing item")?;

        assert_eq!(item.price, 10_00);
        assert_eq!(item.subtotal, 20_00);
        assert_eq!(reloaded.total, 20_00);
        assert_eq!(reloaded.items, created.items);

        Ok(())
    }

    #[tokio::test]
    async fn failed_restore_leaves_order_and_stock_unchanged() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 10_00, 10))
            .await?;

        let mouse = ctx
            .products
            .create_product(new_product("Wireless Mouse", 5_00, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 2), line(mouse.id, 1)]))
            .await?;

        let full = u64::try_from(i64::MAX)?;

        ctx.products
            .update_product(
                mouse.id,
                ProductUpdate {
                    stock: Some(full),
                    ..ProductUpdate::default()
                },
            )
            .await?;

        let result = ctx.orders.cancel_order(created.id).await;

        assert!(
            matches!(&result, Err(error) if error.kind() == ErrorKind::Internal),
            "expected the stock overflow to fail the cancellation, got {result:?}"
        );

        let reloaded = ctx.orders.get_order(created.id).await?;

        assert_eq!(reloaded.status, OrderStatus::Pending);
        assert_eq!(stock_of(&ctx, lamp.id).await?, 8);
        assert_eq!(stock_of(&ctx, mouse.id).await?, full);

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_shipped_order_restores_stock() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 5))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 5)]))
            .await?;

        ctx.orders
            .update_order_status(created.id, OrderStatus::Shipped)
            .await?;

        ctx.orders.cancel_order(created.id).await?;

        assert_eq!(stock_of(&ctx, lamp.id).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn terminal_orders_reject_every_update() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let delivered = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 1)]))
            .await?;

        ctx.orders
            .update_order_status(delivered.id, OrderStatus::Shipped)
            .await?;
        ctx.orders
            .update_order_status(delivered.id, OrderStatus::Delivered)
            .await?;

        for status in OrderStatus::ALL {
            let result = ctx.orders.update_order_status(delivered.id, status).await;

            assert!(
                matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
                "expected InvalidTransition for {status}, got {result:?}"
            );
        }

        assert_eq!(stock_of(&ctx, lamp.id).await?, 9);

        Ok(())
    }

    #[tokio::test]
    async fn pending_cannot_skip_to_delivered() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let created = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 1)]))
            .await?;

        let result = ctx
            .orders
            .update_order_status(created.id, OrderStatus::Delivered)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );
        assert_eq!(
            ctx.orders.get_order(created.id).await?.status,
            OrderStatus::Pending
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let ctx = TestContext::new().await;

        let get = ctx.orders.get_order(OrderId::new(404)).await;
        let update = ctx
            .orders
            .update_order_status(OrderId::new(404), OrderStatus::Shipped)
            .await;

        assert!(
            matches!(get, Err(OrdersServiceError::NotFound(_))),
            "expected NotFound, got {get:?}"
        );
        assert!(
            matches!(update, Err(OrdersServiceError::NotFound(_))),
            "expected NotFound, got {update:?}"
        );
    }

    #[tokio::test]
    async fn user_orders_are_listed_newest_first() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 19_99, 10))
            .await?;

        let first = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 1)]))
            .await?;

        let second = ctx
            .orders
            .create_order(order(vec![line(lamp.id, 2)]))
            .await?;

        ctx.orders
            .create_order(NewOrder {
                user: UserId::new(2),
                items: vec![line(lamp.id, 1)],
            })
            .await?;

        let ids: Vec<OrderId> = ctx
            .orders
            .list_user_orders(USER)
            .await?
            .iter()
            .map(|order| order.id)
            .collect();

        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(ctx.orders.list_orders().await?.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn empty_range_report_is_all_zero() -> TestResult {
        let ctx = TestContext::new().await;

        let start = Timestamp::UNIX_EPOCH;
        let end = start.checked_add(SignedDuration::from_hours(1))?;

        let report = ctx
            .orders
            .sales_report(start, end, DEFAULT_TOP_SELLERS)
            .await?;

        assert_eq!(report.order_count, 0);
        assert_eq!(report.total_sales, 0);
        assert_eq!(report.average_order_value, 0);
        assert!(report.top_products.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn report_includes_cancelled_orders_and_ranks_sellers() -> TestResult {
        let ctx = TestContext::new().await;

        let lamp = ctx
            .products
            .create_product(new_product("Desk Lamp", 10_00, 20))
            .await?;

        let mouse = ctx
            .products
            .create_product(new_product("Wireless Mouse", 5_00, 20))
            .await?;

        let rug = ctx
            .products
            .create_product(new_product("Rug", 1_00, 20))
            .await?;

        ctx.orders
            .create_order(order(vec![line(lamp.id, 1), line(mouse.id, 3)]))
            .await?;

        let cancelled = ctx
            .orders
            .create_order(order(vec![line(rug.id, 1)]))
            .await?;

        ctx.orders.cancel_order(cancelled.id).await?;

        let (start, end) = around_now()?;

        let report = ctx.orders.sales_report(start, end, 2).await?;

        assert_eq!(report.order_count, 2);
        assert_eq!(report.total_sales, 25_00 + 1_00);
        assert_eq!(report.average_order_value, 13_00);

        let ranked: Vec<(ProductId, u64)> = report
            .top_products
            .iter()
            .map(|top| (top.product.id, top.quantity_sold))
            .collect();

        assert_eq!(ranked, vec![(mouse.id, 3), (lamp.id, 1)]);

        Ok(())
    }
}
