//! Error Kinds

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Transport-independent classification of service failures.
///
/// Every service error exposes a `kind()` so an outer layer can map failures to
/// status codes without matching on each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed, missing or non-positive arguments.
    InvalidInput,

    /// A referenced entity does not exist.
    NotFound,

    /// Requested quantity exceeds available stock.
    InsufficientStock,

    /// Illegal order status change.
    InvalidTransition,

    /// Duplicate unique key or a row still referenced elsewhere.
    Conflict,

    /// Unexpected storage failure.
    Internal,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::InsufficientStock => "insufficient_stock",
            Self::InvalidTransition => "invalid_transition",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
