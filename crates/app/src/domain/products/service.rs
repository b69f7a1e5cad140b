//! Products service.

use async_trait::async_trait;
use mockall::automock;
use storefront::{Ranked, search::search};
use tracing::info;

use crate::{
    database::Db,
    domain::products::{
        data::{NewProduct, ProductSearch, ProductUpdate, ensure_storable},
        errors::ProductsServiceError,
        records::{ProductId, ProductRecord},
        repository::{PgProductsRepository, PriceRange},
    },
};

/// Stock at or below which a product is reported as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 5;

/// Maximum number of featured products returned.
pub const FEATURED_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self.repository.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn get_product(&self, product: ProductId) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let found = self.repository.find_product(&mut tx, product).await?;

        tx.commit().await?;

        found.ok_or(ProductsServiceError::NotFound(product))
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, product),
        fields(name = %product.name, price = product.price),
        err
    )]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        product.ensure_storable()?;

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_product(&mut tx, &product).await?;

        tx.commit().await?;

        info!(product = %created.id, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, update),
        fields(product = %product),
        err
    )]
    async fn update_product(
        &self,
        product: ProductId,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        update.ensure_storable()?;

        let mut tx = self.db.begin_transaction().await?;

        let updated = self
            .repository
            .update_product(&mut tx, product, &update)
            .await?
            .ok_or(ProductsServiceError::NotFound(product))?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "products.service.delete_product",
        skip(self),
        fields(product = %product),
        err
    )]
    async fn delete_product(&self, product: ProductId) -> Result<(), ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound(product));
        }

        tx.commit().await?;

        info!(product = %product, "deleted product");

        Ok(())
    }

    #[tracing::instrument(
        name = "products.service.search_products",
        skip(self, request),
        fields(query = ?request.filter.query, enhanced = request.enhanced),
        err
    )]
    async fn search_products(
        &self,
        request: ProductSearch,
    ) -> Result<Vec<Ranked<ProductRecord>>, ProductsServiceError> {
        let ProductSearch { filter, enhanced } = request;

        ensure_storable(filter.min_price)?;
        ensure_storable(filter.max_price)?;

        let mut tx = self.db.begin_transaction().await?;

        let candidates = match filter.query() {
            Some(text) if !enhanced => {
                let prefiltered = self
                    .repository
                    .search_products(
                        &mut tx,
                        text,
                        filter.category.as_deref(),
                        PriceRange {
                            min: filter.min_price,
                            max: filter.max_price,
                        },
                    )
                    .await?;

                if prefiltered.is_empty() {
                    self.repository.list_products(&mut tx).await?
                } else {
                    prefiltered
                }
            }
            _ => self.repository.list_products(&mut tx).await?,
        };

        tx.commit().await?;

        Ok(search(&candidates, &filter))
    }

    async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self.repository.list_by_category(&mut tx, category).await?;

        tx.commit().await?;

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.update_stock",
        skip(self),
        fields(product = %product, delta),
        err
    )]
    async fn update_stock(
        &self,
        product: ProductId,
        delta: i64,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let Some(updated) = self.repository.adjust_stock(&mut tx, product, delta).await? else {
            let current = self
                .repository
                .find_product(&mut tx, product)
                .await?
                .ok_or(ProductsServiceError::NotFound(product))?;

            return Err(ProductsServiceError::InsufficientStock {
                product,
                requested: delta.unsigned_abs(),
                available: current.stock,
            });
        };

        tx.commit().await?;

        info!(product = %product, stock = updated.stock, "adjusted stock");

        Ok(updated)
    }

    async fn low_stock_products(
        &self,
        threshold: u64,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        ensure_storable(Some(threshold))?;

        let mut tx = self.db.begin_transaction().await?;

        let products = self
            .repository
            .low_stock_products(&mut tx, threshold)
            .await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn featured_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self
            .repository
            .featured_products(&mut tx, FEATURED_LIMIT)
            .await?;

        tx.commit().await?;

        Ok(products)
    }

    async fn categories(&self) -> Result<Vec<String>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let categories = self.repository.list_categories(&mut tx).await?;

        tx.commit().await?;

        Ok(categories)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all products, ordered by id.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductId) -> Result<ProductRecord, ProductsServiceError>;

    /// Creates a new product.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Applies a partial update to a product.
    async fn update_product(
        &self,
        product: ProductId,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Deletes a product that no order references.
    async fn delete_product(&self, product: ProductId) -> Result<(), ProductsServiceError>;

    /// Text prefilter in the database, then relevance ranking.
    ///
    /// The whole catalog is ranked instead when the prefilter matches nothing or
    /// when `enhanced` is set.
    async fn search_products(
        &self,
        request: ProductSearch,
    ) -> Result<Vec<Ranked<ProductRecord>>, ProductsServiceError>;

    /// Products in exactly the given category.
    async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Adds `delta` to a product's stock, failing if the result would be negative.
    async fn update_stock(
        &self,
        product: ProductId,
        delta: i64,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// In-stock products with at most `threshold` units left.
    async fn low_stock_products(
        &self,
        threshold: u64,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    async fn featured_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Distinct categories, sorted.
    async fn categories(&self) -> Result<Vec<String>, ProductsServiceError>;
}
