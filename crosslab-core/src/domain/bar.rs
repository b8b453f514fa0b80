//! Bar — the fundamental market data unit.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fixed-interval OHLC sample plus its precomputed indicator snapshot.
///
/// Indicator columns are `None` before their warmup completes. The two RSI
/// columns are only populated on 2-hour boundary bars; everywhere else they
/// stay `None` by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Open time, UTC, at bar-interval granularity.
    pub open_time: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Short-span EMA on close (11 in the default parameterization).
    pub ema_short: Option<Decimal>,
    /// Mid-span EMA on close (30).
    pub ema_mid: Option<Decimal>,
    /// Long-span EMA on close (110).
    pub ema_long: Option<Decimal>,
    /// Second long-span EMA on close (200).
    pub ema_long2: Option<Decimal>,
    /// SMA-smoothed TEMA on the bar midpoint price.
    pub tema: Option<Decimal>,
    /// RSI computed on 2-hour closes; boundary bars only.
    pub rsi_2h: Option<Decimal>,
    /// SMA of `rsi_2h`; boundary bars only.
    pub rsi_2h_avg: Option<Decimal>,
    /// True when the bar body is disproportionately large versus recent bars.
    pub impulse: bool,
}

impl Bar {
    /// Candle body extent: |close - open|.
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Body bounds as (low, high).
    pub fn body_range(&self) -> (Decimal, Decimal) {
        (self.open.min(self.close), self.open.max(self.close))
    }

    /// True on bars that open a 2-hour block (UTC minute 0, even hour).
    /// RSI exit checks run only on these bars.
    pub fn is_two_hour_boundary(&self) -> bool {
        self.open_time.minute() == 0 && self.open_time.hour() % 2 == 0
    }
}

/// Checks the engine's input precondition: open times strictly ascending.
/// Returns the offending index (of the second bar in the violating pair).
pub fn first_ordering_violation(bars: &[Bar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].open_time <= w[0].open_time)
        .map(|i| i + 1)
}
