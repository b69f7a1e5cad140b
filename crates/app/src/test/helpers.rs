//! Test Helpers

use jiff::Timestamp;

use crate::domain::products::{ProductId, ProductRecord, data::NewProduct};

/// A new uncategorised product whose description mentions its name.
pub(crate) fn new_product(name: &str, price: u64, stock: u64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} for everyday use"),
        price,
        stock,
        category: None,
        featured: false,
    }
}

/// A catalog record for tests that never touch the database.
pub(crate) fn product_record(id: i64, price: u64, stock: u64) -> ProductRecord {
    ProductRecord {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: format!("Description of product {id}"),
        price,
        stock,
        category: "Uncategorized".to_string(),
        featured: false,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
