//! Cart Storage

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{carts::models::Cart, users::UserId};

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

/// Keyed storage for carts.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's saved cart, if one exists.
    async fn load(&self, user: UserId) -> Result<Option<Cart>, CartStoreError>;

    /// Replace the user's saved cart.
    async fn save(&self, cart: Cart) -> Result<(), CartStoreError>;
}

/// Process-local cart storage. Carts are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<FxHashMap<UserId, Cart>>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, user: UserId) -> Result<Option<Cart>, CartStoreError> {
        Ok(self.carts.read().await.get(&user).cloned())
    }

    async fn save(&self, cart: Cart) -> Result<(), CartStoreError> {
        self.carts.write().await.insert(cart.user, cart);

        Ok(())
    }
}
