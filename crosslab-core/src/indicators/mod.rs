//! Indicator pipeline.
//!
//! Everything the engine reads off a [`Bar`](crate::domain::Bar) is computed
//! here, once, before the bar loop: four close-price EMAs, the SMA-smoothed
//! TEMA on the bar midpoint, the 2-hour RSI pair, and the impulse flag. All
//! arithmetic is `Decimal` with divisions carried at intermediate precision,
//! so a given candle series enriches identically on every run.

pub mod ema;
pub mod enrich;
pub mod impulse;
pub mod rsi;
pub mod sma;
pub mod tema;

pub use ema::ema_series;
pub use enrich::{enrich_candles, Candle, IndicatorParams};
pub use impulse::impulse_flags;
pub use rsi::{floor_to_two_hours, rsi_series, two_hour_closes};
pub use sma::sma_series;
pub use tema::{smoothed_tema_series, tema_series};

/// Parse a decimal series for tests.
#[cfg(test)]
pub(crate) fn dec_series(values: &[&str]) -> Vec<rust_decimal::Decimal> {
    values.iter().map(|v| v.parse().unwrap()).collect()
}

/// Parse a null-free optional series for tests.
#[cfg(test)]
pub(crate) fn opt_series(values: &[&str]) -> Vec<Option<rust_decimal::Decimal>> {
    values.iter().map(|v| Some(v.parse().unwrap())).collect()
}
