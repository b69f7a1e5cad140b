//! Pricing
//!
//! Amounts are `u64` counts of minor currency units, so `19.99` is `1999`.

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Amount arithmetic overflowed `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount overflow")]
pub struct AmountOverflow;

/// Price × quantity for a single line.
///
/// # Errors
///
/// Returns [`AmountOverflow`] when the product does not fit in `u64`.
pub fn line_subtotal(price: u64, quantity: u32) -> Result<u64, AmountOverflow> {
    price.checked_mul(u64::from(quantity)).ok_or(AmountOverflow)
}

/// Sum of `(price, quantity)` lines.
///
/// # Errors
///
/// Returns [`AmountOverflow`] when any subtotal or the sum does not fit in `u64`.
pub fn total<I>(lines: I) -> Result<u64, AmountOverflow>
where
    I: IntoIterator<Item = (u64, u32)>,
{
    lines.into_iter().try_fold(0_u64, |sum, (price, quantity)| {
        sum.checked_add(line_subtotal(price, quantity)?)
            .ok_or(AmountOverflow)
    })
}

/// Mean of `total` over `count`, rounded half away from zero to a whole minor unit.
///
/// Zero when `count` is zero.
pub fn average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }

    (Decimal::from(total) / Decimal::from(count))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}
