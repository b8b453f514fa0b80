//! Triple Exponential Moving Average (TEMA) with SMA smoothing.
//!
//! TEMA[t] = 3*EMA1[t] - 3*EMA2[t] + EMA3[t], where EMA2 and EMA3 re-run the
//! EMA over the previous stage with its nulls coerced to zero. The coercion
//! biases the first values after warmup low; downstream consumers are
//! calibrated against exactly this series, so it stays.

use super::ema::ema_series;
use super::sma::sma_series;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Raw TEMA of `values`; null before index `period - 1`.
pub fn tema_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let ema1 = ema_series(values, period);
    let ema2 = ema_series(&zeros_for_nulls(&ema1), period);
    let ema3 = ema_series(&zeros_for_nulls(&ema2), period);

    let three = dec!(3);
    ema1.iter()
        .zip(&ema2)
        .zip(&ema3)
        .map(|((e1, e2), e3)| match (e1, e2, e3) {
            (Some(e1), Some(e2), Some(e3)) => Some(three * e1 - three * e2 + e3),
            _ => None,
        })
        .collect()
}

/// TEMA smoothed by an SMA pass; the `tema` column of an enriched bar.
pub fn smoothed_tema_series(
    values: &[Decimal],
    period: usize,
    smooth: usize,
) -> Vec<Option<Decimal>> {
    sma_series(&tema_series(values, period), smooth)
}

fn zeros_for_nulls(values: &[Option<Decimal>]) -> Vec<Decimal> {
    values.iter().map(|v| v.unwrap_or(Decimal::ZERO)).collect()
}
