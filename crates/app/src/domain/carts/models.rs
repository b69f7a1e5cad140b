//! Cart Models

use serde::Serialize;
use storefront::pricing::{self, AmountOverflow};

use crate::domain::{
    products::{ProductId, ProductRecord},
    users::UserId,
};

/// A product in a cart, with a snapshot of its catalog data.
///
/// `name`, `price` and `current_stock` are refreshed whenever the cart is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product: ProductId,
    pub name: String,
    pub price: u64,
    pub current_stock: u64,
    pub quantity: u32,
}

impl CartItem {
    pub(crate) fn new(product: &ProductRecord, quantity: u32) -> Self {
        Self {
            product: product.id,
            name: product.name.clone(),
            price: product.price,
            current_stock: product.stock,
            quantity,
        }
    }

    pub(crate) fn refresh(&mut self, product: &ProductRecord) {
        self.name.clone_from(&product.name);
        self.price = product.price;
        self.current_stock = product.stock;
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub user: UserId,
    pub items: Vec<CartItem>,

    /// Σ price × quantity over `items`.
    pub total: u64,
}

impl Cart {
    pub const fn empty(user: UserId) -> Self {
        Self {
            user,
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product == product)
    }

    pub(crate) fn item_mut(&mut self, product: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product == product)
    }

    pub(crate) fn recompute_total(&mut self) -> Result<(), AmountOverflow> {
        self.total = pricing::total(self.items.iter().map(|item| (item.price, item.quantity)))?;

        Ok(())
    }
}
