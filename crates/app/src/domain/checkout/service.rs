//! Checkout service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::{info, warn};

use crate::domain::{
    carts::CartsService,
    checkout::errors::CheckoutError,
    orders::{
        OrderRecord, OrdersService,
        data::{NewOrder, NewOrderItem},
    },
    users::UserId,
};

/// Turns explicit item lists or saved carts into orders.
pub struct DefaultCheckoutService {
    carts: Arc<dyn CartsService>,
    orders: Arc<dyn OrdersService>,
}

impl fmt::Debug for DefaultCheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCheckoutService").finish_non_exhaustive()
    }
}

impl DefaultCheckoutService {
    #[must_use]
    pub fn new(carts: Arc<dyn CartsService>, orders: Arc<dyn OrdersService>) -> Self {
        Self { carts, orders }
    }
}

#[async_trait]
impl CheckoutService for DefaultCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.place_order",
        skip(self, items),
        fields(user = %user, from_cart = items.is_none()),
        err
    )]
    async fn place_order(
        &self,
        user: UserId,
        items: Option<Vec<NewOrderItem>>,
    ) -> Result<OrderRecord, CheckoutError> {
        if let Some(items) = items {
            return Ok(self.orders.create_order(NewOrder { user, items }).await?);
        }

        let cart = self.carts.get_cart(user).await?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart(user));
        }

        let items = cart
            .items
            .iter()
            .map(|item| NewOrderItem {
                product: item.product,
                quantity: item.quantity,
            })
            .collect();

        let order = self.orders.create_order(NewOrder { user, items }).await?;

        if let Err(error) = self.carts.remove_ordered(user, cart.items).await {
            warn!(order = %order.id, error = %error, "order placed but cart was not updated");
        } else {
            info!(order = %order.id, "checked out cart");
        }

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Place an order for `items`, or for the user's cart when `items` is `None`.
    ///
    /// The ordered lines leave the cart only once the order has been created. Lines
    /// added while the order was being placed stay in the cart.
    async fn place_order(
        &self,
        user: UserId,
        items: Option<Vec<NewOrderItem>>,
    ) -> Result<OrderRecord, CheckoutError>;
}
