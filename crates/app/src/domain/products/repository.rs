//! Products Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::{
    database::{try_get_amount, try_get_timestamp, try_i64_from_u64},
    domain::products::{
        data::{NewProduct, ProductUpdate},
        records::{ProductId, ProductRecord},
    },
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LOCK_PRODUCTS_SQL: &str = include_str!("sql/lock_products.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const ADJUST_STOCK_SQL: &str = include_str!("sql/adjust_stock.sql");
const SEARCH_PRODUCTS_SQL: &str = include_str!("sql/search_products.sql");
const LIST_BY_CATEGORY_SQL: &str = include_str!("sql/list_by_category.sql");
const LOW_STOCK_PRODUCTS_SQL: &str = include_str!("sql/low_stock_products.sql");
const FEATURED_PRODUCTS_SQL: &str = include_str!("sql/featured_products.sql");
const LIST_CATEGORIES_SQL: &str = include_str!("sql/list_categories.sql");

/// Structural filters applied alongside the text prefilter.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PriceRange {
    pub(crate) min: Option<u64>,
    pub(crate) max: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductId,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.get())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock the given product rows for the rest of the transaction.
    ///
    /// Rows are locked in ascending id order. Ids with no row are simply absent
    /// from the result.
    pub(crate) async fn lock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductId],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let ids: Vec<i64> = products.iter().map(|product| product.get()).collect();

        debug!(count = ids.len(), "locking product rows");

        query_as::<Postgres, ProductRecord>(LOCK_PRODUCTS_SQL)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(&product.name)
            .bind(&product.description)
            .bind(try_i64_from_u64(product.price, "price")?)
            .bind(try_i64_from_u64(product.stock, "stock")?)
            .bind(product.category_or_default())
            .bind(product.featured)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        let price = update
            .price
            .map(|price| try_i64_from_u64(price, "price"))
            .transpose()?;

        let stock = update
            .stock
            .map(|stock| try_i64_from_u64(stock, "stock"))
            .transpose()?;

        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(product.get())
            .bind(update.name.as_deref())
            .bind(update.description.as_deref())
            .bind(price)
            .bind(stock)
            .bind(update.category.as_deref())
            .bind(update.featured)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductId,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.get())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Add `delta` to a product's stock.
    ///
    /// Returns `None` when the product is missing or the result would be negative;
    /// the row is left untouched in both cases.
    pub(crate) async fn adjust_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductId,
        delta: i64,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        debug!(product = %product, delta, "adjusting stock");

        query_as::<Postgres, ProductRecord>(ADJUST_STOCK_SQL)
            .bind(product.get())
            .bind(delta)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn search_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        text: &str,
        category: Option<&str>,
        prices: PriceRange,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let min = prices
            .min
            .map(|min| try_i64_from_u64(min, "price"))
            .transpose()?;

        let max = prices
            .max
            .map(|max| try_i64_from_u64(max, "price"))
            .transpose()?;

        query_as::<Postgres, ProductRecord>(SEARCH_PRODUCTS_SQL)
            .bind(like_pattern(text))
            .bind(category)
            .bind(min)
            .bind(max)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_by_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: &str,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_BY_CATEGORY_SQL)
            .bind(category)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn low_stock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        threshold: u64,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LOW_STOCK_PRODUCTS_SQL)
            .bind(try_i64_from_u64(threshold, "stock")?)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn featured_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit: i64,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(FEATURED_PRODUCTS_SQL)
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<String>, sqlx::Error> {
        query_scalar::<Postgres, String>(LIST_CATEGORIES_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

/// `%text%` with `LIKE` metacharacters escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);

    pattern.push('%');

    for c in text.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }

        pattern.push(c);
    }

    pattern.push('%');

    pattern
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_amount(row, "stock")?,
            category: row.try_get("category")?,
            featured: row.try_get("featured")?,
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}
