//! Products Data

use std::num::TryFromIntError;

use storefront::SearchOptions;

/// Fail when an amount would not fit a `BIGINT` column.
pub(crate) fn ensure_storable(amount: Option<u64>) -> Result<(), TryFromIntError> {
    amount.map(i64::try_from).transpose().map(|_| ())
}

/// Category assigned when none is given.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    /// Price in minor currency units.
    pub price: u64,
    pub stock: u64,
    pub category: Option<String>,
    pub featured: bool,
}

impl NewProduct {
    pub(crate) fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub(crate) fn ensure_storable(&self) -> Result<(), TryFromIntError> {
        ensure_storable(Some(self.price))?;
        ensure_storable(Some(self.stock))
    }
}

/// Product Update Data
///
/// Only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<u64>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl ProductUpdate {
    pub(crate) fn ensure_storable(&self) -> Result<(), TryFromIntError> {
        ensure_storable(self.price)?;
        ensure_storable(self.stock)
    }
}

/// Product Search Data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSearch {
    pub filter: SearchOptions,

    /// Rank the whole catalog even when the text prefilter found matches.
    pub enhanced: bool,
}
