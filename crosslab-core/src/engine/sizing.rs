//! Risk-based position sizing.
//!
//! Quantity is the risk budget spread over the per-unit loss at the stop
//! plus the round-trip fee on entry notional. The result is floored to the
//! lot step; a positive size that floors below the venue minimum is bumped
//! up to it rather than discarded.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::config::SimConfig;
use crate::math::{div10, floor_to_step};

/// Stops tighter than this are rejected in the hedged profile.
const HEDGED_MIN_DELTA: Decimal = dec!(0.01);

/// Quantity for an entry at `entry` protected by `stop`, or zero when the
/// trade cannot be sized.
pub fn position_quantity(
    entry: Decimal,
    stop: Decimal,
    risk_budget: Decimal,
    cfg: &SimConfig,
) -> Decimal {
    let delta = (entry - stop).abs();
    if cfg.hedge && delta < HEDGED_MIN_DELTA {
        return Decimal::ZERO;
    }

    let denom = delta + entry * cfg.fee_rate;
    if denom <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = match div10(risk_budget, denom) {
        Some(q) => q,
        None => return Decimal::ZERO,
    };
    if raw <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let floored = floor_to_step(raw, cfg.step_qty);
    if floored < cfg.min_qty {
        // `raw` is positive here, so the size is bumped, not dropped.
        return cfg.min_qty;
    }
    floored
}
