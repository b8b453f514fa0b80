//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * v[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[period-1] = plain mean of the first `period` values.
//! alpha = 2 / (period + 1); every step rounds at intermediate precision.
//! Period <= 1 passes the input through unchanged.

use crate::math::{round_half_up, INTERMEDIATE_DP};
use rust_decimal::Decimal;

/// EMA of `values`; null before index `period - 1`, or everywhere when the
/// series is shorter than one period.
pub fn ema_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    if period <= 1 {
        return values.iter().copied().map(Some).collect();
    }

    let mut out = vec![None; n];
    if n < period {
        return out;
    }

    let divisor = Decimal::from(period as u64);
    let alpha = round_half_up(
        Decimal::TWO / Decimal::from(period as u64 + 1),
        INTERMEDIATE_DP,
    );
    let one_minus = Decimal::ONE - alpha;

    let mut sum = Decimal::ZERO;
    for v in &values[..period] {
        sum += *v;
    }
    let mut prev = round_half_up(sum / divisor, INTERMEDIATE_DP);
    out[period - 1] = Some(prev);

    for i in period..n {
        let ema = round_half_up(alpha * values[i] + one_minus * prev, INTERMEDIATE_DP);
        out[i] = Some(ema);
        prev = ema;
    }

    out
}
