//! Impulse flag: a candle body abruptly larger than its recent neighborhood.

use crate::math::{round_half_up, INTERMEDIATE_DP};
use rust_decimal::Decimal;

/// Flags index `i` when `bodies[i] >= multiplier * mean(bodies[i-lookback..i])`
/// and that mean is positive. The first `lookback` indices stay false.
pub fn impulse_flags(bodies: &[Decimal], multiplier: Decimal, lookback: usize) -> Vec<bool> {
    let mut out = vec![false; bodies.len()];
    if lookback == 0 || bodies.len() <= lookback {
        return out;
    }

    let divisor = Decimal::from(lookback as u64);
    let mut sum: Decimal = bodies[..lookback].iter().copied().sum();

    for i in lookback..bodies.len() {
        let mean = round_half_up(sum / divisor, INTERMEDIATE_DP);
        if mean > Decimal::ZERO && bodies[i] >= multiplier * mean {
            out[i] = true;
        }
        sum += bodies[i] - bodies[i - lookback];
    }

    out
}
