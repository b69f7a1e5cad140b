//! Carts service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        models::{Cart, CartItem},
        store::CartStore,
    },
    products::{ProductId, ProductsService, ProductsServiceError},
    users::UserId,
};

/// Carts backed by a [`CartStore`], validated against the catalog.
///
/// Every operation on a user's cart holds that user's lock for the whole
/// read-modify-write, so concurrent calls for one user are applied one at a time.
pub struct DefaultCartsService {
    products: Arc<dyn ProductsService>,
    store: Arc<dyn CartStore>,
    locks: Mutex<FxHashMap<UserId, Arc<Mutex<()>>>>,
}

impl fmt::Debug for DefaultCartsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCartsService").finish_non_exhaustive()
    }
}

impl DefaultCartsService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductsService>, store: Arc<dyn CartStore>) -> Self {
        Self {
            products,
            store,
            locks: Mutex::new(FxHashMap::default()),
        }
    }

    async fn lock_user(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;

            Arc::clone(locks.entry(user).or_default())
        };

        lock.lock_owned().await
    }
}

#[async_trait]
impl CartsService for DefaultCartsService {
    async fn get_cart(&self, user: UserId) -> Result<Cart, CartsServiceError> {
        let _guard = self.lock_user(user).await;

        let Some(mut cart) = self.store.load(user).await? else {
            return Ok(Cart::empty(user));
        };

        for item in &mut cart.items {
            match self.products.get_product(item.product).await {
                Ok(product) => item.refresh(&product),
                Err(ProductsServiceError::NotFound(product)) => {
                    debug!(product = %product, "keeping stale cart snapshot");
                }
                Err(error) => return Err(error.into()),
            }
        }

        cart.recompute_total()?;

        self.store.save(cart.clone()).await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self),
        fields(user = %user, product = %product, quantity),
        err
    )]
    async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        if !product.is_valid() {
            return Err(CartsServiceError::InvalidProduct(product));
        }

        let _guard = self.lock_user(user).await;

        let record = self.products.get_product(product).await?;

        let mut cart = self
            .store
            .load(user)
            .await?
            .unwrap_or_else(|| Cart::empty(user));

        let existing = cart.item(product).map_or(0, |item| item.quantity);

        let requested = existing
            .checked_add(quantity)
            .ok_or(CartsServiceError::InvalidQuantity)?;

        if record.stock < u64::from(requested) {
            return Err(CartsServiceError::InsufficientStock {
                product,
                requested: u64::from(requested),
                available: record.stock,
            });
        }

        if let Some(item) = cart.item_mut(product) {
            item.quantity = requested;
            item.refresh(&record);
        } else {
            cart.items.push(CartItem::new(&record, quantity));
        }

        cart.recompute_total()?;

        self.store.save(cart.clone()).await?;

        info!(total = cart.total, "added item to cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.update_item_quantity",
        skip(self),
        fields(user = %user, product = %product, quantity),
        err
    )]
    async fn update_item_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let _guard = self.lock_user(user).await;

        let mut cart = self
            .store
            .load(user)
            .await?
            .ok_or(CartsServiceError::CartNotFound(user))?;

        if cart.item(product).is_none() {
            return Err(CartsServiceError::ItemNotFound(product));
        }

        let record = self.products.get_product(product).await?;

        if record.stock < u64::from(quantity) {
            return Err(CartsServiceError::InsufficientStock {
                product,
                requested: u64::from(quantity),
                available: record.stock,
            });
        }

        if let Some(item) = cart.item_mut(product) {
            item.quantity = quantity;
            item.current_stock = record.stock;
        }

        cart.recompute_total()?;

        self.store.save(cart.clone()).await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(user = %user, product = %product),
        err
    )]
    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, CartsServiceError> {
        let _guard = self.lock_user(user).await;

        let mut cart = self
            .store
            .load(user)
            .await?
            .ok_or(CartsServiceError::CartNotFound(user))?;

        cart.items.retain(|item| item.product != product);
        cart.recompute_total()?;

        self.store.save(cart.clone()).await?;

        Ok(cart)
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), fields(user = %user), err)]
    async fn clear_cart(&self, user: UserId) -> Result<Cart, CartsServiceError> {
        let _guard = self.lock_user(user).await;

        let cart = Cart::empty(user);

        self.store.save(cart.clone()).await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_ordered",
        skip(self, ordered),
        fields(user = %user, lines = ordered.len()),
        err
    )]
    async fn remove_ordered(
        &self,
        user: UserId,
        ordered: Vec<CartItem>,
    ) -> Result<Cart, CartsServiceError> {
        let _guard = self.lock_user(user).await;

        let mut cart = self
            .store
            .load(user)
            .await?
            .ok_or(CartsServiceError::CartNotFound(user))?;

        for line in &ordered {
            if let Some(item) = cart.item_mut(line.product) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
            }
        }

        cart.items.retain(|item| item.quantity > 0);
        cart.recompute_total()?;

        self.store.save(cart.clone()).await?;

        if !cart.is_empty() {
            debug!(lines = cart.items.len(), "kept cart lines added during checkout");
        }

        Ok(cart)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The user's cart with refreshed product snapshots.
    ///
    /// Users without a saved cart get an empty one, which is not saved.
    async fn get_cart(&self, user: UserId) -> Result<Cart, CartsServiceError>;

    /// Add `quantity` units of a product, merging with an existing line.
    async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Set the quantity of a product already in the cart.
    async fn update_item_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a product from the cart. Removing an absent product is not an error.
    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<Cart, CartsServiceError>;

    /// Replace the user's cart with an empty one.
    async fn clear_cart(&self, user: UserId) -> Result<Cart, CartsServiceError>;

    /// Take the quantities of `ordered` out of the cart.
    ///
    /// Lines added or topped up after `ordered` was read are kept.
    async fn remove_ordered(
        &self,
        user: UserId,
        ordered: Vec<CartItem>,
    ) -> Result<Cart, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use testresult::TestResult;

    use crate::{
        domain::{
            carts::store::{CartStoreError, InMemoryCartStore},
            errors::ErrorKind,
            products::MockProductsService,
        },
        test::helpers::product_record,
    };

    use super::*;

    const USER: UserId = UserId::new(1);

    /// Catalog where every product id exists with the given price and stock.
    fn catalog(price: u64, stock: u64) -> MockProductsService {
        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .returning(move |id| Ok(product_record(id.get(), price, stock)));

        products
    }

    fn service(products: MockProductsService) -> DefaultCartsService {
        DefaultCartsService::new(Arc::new(products), Arc::new(InMemoryCartStore::new()))
    }

    #[tokio::test]
    async fn add_item_creates_line_with_snapshot() -> TestResult {
        let carts = service(catalog(19_99, 10));

        let cart = carts.add_item(USER, ProductId::new(1), 2).await?;

        assert_eq!(cart.total, 39_98);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(
            cart.item(ProductId::new(1)).map(|item| (item.quantity, item.current_stock)),
            Some((2, 10))
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_then_remove_restores_total() -> TestResult {
        let carts = service(catalog(5_00, 10));

        let before = carts.add_item(USER, ProductId::new(1), 1).await?;
        carts.add_item(USER, ProductId::new(2), 3).await?;

        let after = carts.remove_item(USER, ProductId::new(2)).await?;

        assert_eq!(after.total, before.total);
        assert_eq!(after.items, before.items);

        Ok(())
    }

    #[tokio::test]
    async fn repeated_add_merges_quantities() -> TestResult {
        let carts = service(catalog(5_00, 10));

        carts.add_item(USER, ProductId::new(1), 2).await?;
        let cart = carts.add_item(USER, ProductId::new(1), 3).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item(ProductId::new(1)).map(|item| item.quantity), Some(5));
        assert_eq!(cart.total, 25_00);

        Ok(())
    }

    #[tokio::test]
    async fn adds_beyond_stock_fail_and_keep_first_addition() -> TestResult {
        let carts = service(catalog(5_00, 5));

        carts.add_item(USER, ProductId::new(1), 3).await?;

        let result = carts.add_item(USER, ProductId::new(1), 3).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InsufficientStock {
                    requested: 6,
                    available: 5,
                    ..
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );

        let cart = carts.get_cart(USER).await?;

        assert_eq!(cart.item(ProductId::new(1)).map(|item| item.quantity), Some(3));
        assert_eq!(cart.total, 15_00);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_bad_input_before_lookup() {
        let mut products = MockProductsService::new();
        products.expect_get_product().never();

        let carts = service(products);

        let zero = carts.add_item(USER, ProductId::new(1), 0).await;
        let bad_id = carts.add_item(USER, ProductId::new(0), 1).await;

        assert!(
            matches!(zero, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {zero:?}"
        );
        assert!(
            matches!(bad_id, Err(CartsServiceError::InvalidProduct(_))),
            "expected InvalidProduct, got {bad_id:?}"
        );
    }

    #[tokio::test]
    async fn add_unknown_product_is_not_found() {
        let mut products = MockProductsService::new();
        products
            .expect_get_product()
            .returning(|id| Err(ProductsServiceError::NotFound(id)));

        let carts = service(products);

        let result = carts.add_item(USER, ProductId::new(7), 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotFound(id)) if id == ProductId::new(7)),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_cart_without_saved_cart_is_empty_and_unsaved() -> TestResult {
        let store = Arc::new(InMemoryCartStore::new());
        let carts = DefaultCartsService::new(Arc::new(MockProductsService::new()), store.clone());

        let cart = carts.get_cart(USER).await?;

        assert!(cart.is_empty());
        assert_eq!(cart.total, 0);
        assert_eq!(store.load(USER).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_refreshes_snapshots() -> TestResult {
        let price = Arc::new(AtomicU64::new(10_00));
        let current = Arc::clone(&price);

        let mut products = MockProductsService::new();
        products
            .expect_get_product()
            .returning(move |id| Ok(product_record(id.get(), current.load(Ordering::SeqCst), 8)));

        let carts = service(products);

        carts.add_item(USER, ProductId::new(1), 2).await?;

        price.store(12_50, Ordering::SeqCst);

        let cart = carts.get_cart(USER).await?;

        assert_eq!(cart.item(ProductId::new(1)).map(|item| item.price), Some(12_50));
        assert_eq!(cart.total, 25_00);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_keeps_stale_snapshot_for_missing_product() -> TestResult {
        let deleted = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&deleted);

        let mut products = MockProductsService::new();
        products.expect_get_product().returning(move |id| {
            if flag.load(Ordering::SeqCst) == 1 {
                Err(ProductsServiceError::NotFound(id))
            } else {
                Ok(product_record(id.get(), 7_00, 3))
            }
        });

        let carts = service(products);

        carts.add_item(USER, ProductId::new(1), 1).await?;

        deleted.store(1, Ordering::SeqCst);

        let cart = carts.get_cart(USER).await?;

        assert_eq!(cart.item(ProductId::new(1)).map(|item| item.price), Some(7_00));
        assert_eq!(cart.total, 7_00);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_propagates_catalog_failures() -> TestResult {
        let broken = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&broken);

        let mut products = MockProductsService::new();
        products.expect_get_product().returning(move |id| {
            if flag.load(Ordering::SeqCst) == 1 {
                Err(ProductsServiceError::Sql(sqlx::Error::PoolTimedOut))
            } else {
                Ok(product_record(id.get(), 7_00, 3))
            }
        });

        let carts = service(products);

        carts.add_item(USER, ProductId::new(1), 1).await?;

        broken.store(1, Ordering::SeqCst);

        let result = carts.get_cart(USER).await;

        assert!(
            matches!(&result, Err(error) if error.kind() == ErrorKind::Internal),
            "expected an internal error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_checks_stock() -> TestResult {
        let carts = service(catalog(5_00, 4));

        carts.add_item(USER, ProductId::new(1), 1).await?;

        let cart = carts.update_item_quantity(USER, ProductId::new(1), 4).await?;

        assert_eq!(cart.total, 20_00);

        let result = carts.update_item_quantity(USER, ProductId::new(1), 5).await;

        assert!(
            matches!(result, Err(CartsServiceError::InsufficientStock { .. })),
            "expected InsufficientStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_item_quantity_requires_cart_and_line() -> TestResult {
        let carts = service(catalog(5_00, 4));

        let no_cart = carts.update_item_quantity(USER, ProductId::new(1), 1).await;

        assert!(
            matches!(no_cart, Err(CartsServiceError::CartNotFound(user)) if user == USER),
            "expected CartNotFound, got {no_cart:?}"
        );

        carts.add_item(USER, ProductId::new(1), 1).await?;

        let no_line = carts.update_item_quantity(USER, ProductId::new(2), 1).await;

        assert!(
            matches!(no_line, Err(CartsServiceError::ItemNotFound(_))),
            "expected ItemNotFound, got {no_line:?}"
        );

        let zero = carts.update_item_quantity(USER, ProductId::new(1), 0).await;

        assert!(
            matches!(zero, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {zero:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_is_idempotent_but_needs_a_cart() -> TestResult {
        let carts = service(catalog(5_00, 4));

        let missing = carts.remove_item(USER, ProductId::new(1)).await;

        assert!(
            matches!(missing, Err(CartsServiceError::CartNotFound(_))),
            "expected CartNotFound, got {missing:?}"
        );

        carts.add_item(USER, ProductId::new(1), 2).await?;

        let cart = carts.remove_item(USER, ProductId::new(9)).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_empties_cart() -> TestResult {
        let carts = service(catalog(5_00, 4));

        carts.add_item(USER, ProductId::new(1), 2).await?;

        let cleared = carts.clear_cart(USER).await?;

        assert!(cleared.is_empty());
        assert_eq!(carts.get_cart(USER).await?, Cart::empty(USER));

        Ok(())
    }

    #[tokio::test]
    async fn remove_ordered_keeps_lines_added_after_the_read() -> TestResult {
        let carts = service(catalog(5_00, 10));

        let ordered = carts.add_item(USER, ProductId::new(1), 2).await?.items;

        carts.add_item(USER, ProductId::new(1), 1).await?;
        carts.add_item(USER, ProductId::new(2), 4).await?;

        let remaining = carts.remove_ordered(USER, ordered).await?;

        assert_eq!(
            remaining
                .items
                .iter()
                .map(|item| (item.product, item.quantity))
                .collect::<Vec<_>>(),
            vec![(ProductId::new(1), 1), (ProductId::new(2), 4)]
        );
        assert_eq!(remaining.total, 25_00);

        Ok(())
    }

    #[tokio::test]
    async fn remove_ordered_drops_fully_ordered_lines() -> TestResult {
        let carts = service(catalog(5_00, 10));

        let ordered = carts.add_item(USER, ProductId::new(3), 2).await?.items;

        let remaining = carts.remove_ordered(USER, ordered).await?;

        assert!(remaining.is_empty());
        assert_eq!(carts.get_cart(USER).await?, Cart::empty(USER));

        Ok(())
    }

    #[tokio::test]
    async fn store_failures_are_internal() {
        let mut store = crate::domain::carts::store::MockCartStore::new();
        store
            .expect_load()
            .returning(|_| Err(CartStoreError::Unavailable("offline".to_string())));

        let carts = DefaultCartsService::new(Arc::new(catalog(5_00, 4)), Arc::new(store));

        let result = carts.add_item(USER, ProductId::new(1), 1).await;

        assert!(
            matches!(&result, Err(error) if error.kind() == ErrorKind::Internal),
            "expected an internal error, got {result:?}"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_for_one_user_are_serialized() -> TestResult {
        let carts = Arc::new(service(catalog(1_00, 1_000)));

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let carts = Arc::clone(&carts);

                tokio::spawn(async move { carts.add_item(USER, ProductId::new(1), 1).await })
            })
            .collect();

        for task in tasks {
            task.await??;
        }

        let cart = carts.get_cart(USER).await?;

        assert_eq!(cart.item(ProductId::new(1)).map(|item| item.quantity), Some(50));
        assert_eq!(cart.total, 50_00);

        Ok(())
    }
}
