//! Decimal rounding and lot arithmetic.
//!
//! All money math in the engine goes through these helpers so the rounding
//! conventions live in one place: prices and P&L round half-up at the
//! configured price scale, quantities at the quantity scale, and
//! intermediate divisions carry 10 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale used for intermediate divisions before any final rounding.
pub const INTERMEDIATE_DP: u32 = 10;

/// Round half-up to `dp` decimal places.
pub fn round_half_up(v: Decimal, dp: u32) -> Decimal {
    v.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Divide with the engine's intermediate precision (10 dp, half-up).
/// Returns `None` when the divisor is zero.
pub fn div10(num: Decimal, den: Decimal) -> Option<Decimal> {
    num.checked_div(den).map(|q| round_half_up(q, INTERMEDIATE_DP))
}

/// Midpoint of two levels at intermediate precision.
pub fn midpoint(a: Decimal, b: Decimal) -> Option<Decimal> {
    div10(a + b, Decimal::TWO)
}

/// Largest multiple of `step` that does not exceed `value`.
/// Non-positive values (and a zero step) collapse to zero.
pub fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    if value <= Decimal::ZERO || step <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match value.checked_div(step) {
        Some(q) => q.trunc() * step,
        None => Decimal::ZERO,
    }
}

/// Relative-gap equivalence: |a - b| / mean(a, b) <= tolerance.
/// A zero mean is equivalent only when the values are identical.
pub fn within_relative_gap(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    let diff = (a - b).abs();
    let mean = match midpoint(a, b) {
        Some(m) => m,
        None => return false,
    };
    if mean.is_zero() {
        return diff.is_zero();
    }
    match div10(diff, mean) {
        Some(rel) => rel <= tolerance,
        None => false,
    }
}
