//! Order Status
//!
//! The order lifecycle as a small state machine:
//!
//! ```text
//! pending ──► shipped ──► delivered
//!    │           │
//!    └───────────┴──────► cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use thiserror::Error;

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, stock reserved, not yet shipped.
    Pending,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer.
    Delivered,

    /// Abandoned; reserved stock has been returned.
    Cancelled,
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot change status of {from} order to {to}")]
pub struct InvalidTransition {
    /// Status the order was in.
    pub from: OrderStatus,

    /// Status that was requested.
    pub to: OrderStatus,
}

/// A status string that names none of the known states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status {0:?}, must be one of: pending, shipped, delivered, cancelled")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Lowercase name used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving to `next` is an allowed edge.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered | Self::Cancelled)
        )
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the current status is terminal or `next` is
    /// not reachable from it.
    pub const fn transition_to(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether entering `next` from this status returns stock to the catalog.
    pub const fn restores_stock(self, next: Self) -> bool {
        !self.is_terminal() && matches!(next, Self::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
