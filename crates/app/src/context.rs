//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, DefaultCartsService, InMemoryCartStore},
        checkout::{CheckoutService, DefaultCheckoutService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl AppContext {
    /// Wire every service over one database.
    ///
    /// Carts live in process memory.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let products: Arc<dyn ProductsService> = Arc::new(PgProductsService::new(db.clone()));
        let orders: Arc<dyn OrdersService> = Arc::new(PgOrdersService::new(db));

        let carts: Arc<dyn CartsService> = Arc::new(DefaultCartsService::new(
            Arc::clone(&products),
            Arc::new(InMemoryCartStore::new()),
        ));

        let checkout = Arc::new(DefaultCheckoutService::new(
            Arc::clone(&carts),
            Arc::clone(&orders),
        ));

        Self {
            products,
            carts,
            orders,
            checkout,
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool)))
    }
}
