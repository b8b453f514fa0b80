//! Candle enrichment: raw OHLCV in, indicator-carrying [`Bar`]s out.

use super::ema::ema_series;
use super::impulse::impulse_flags;
use super::rsi::{rsi_series, two_hour_closes};
use super::sma::sma_series;
use super::tema::smoothed_tema_series;
use crate::domain::Bar;
use crate::math::{round_half_up, INTERMEDIATE_DP};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw input candle, before any indicator is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Periods and rules for the enrichment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_short: usize,
    pub ema_mid: usize,
    pub ema_long: usize,
    pub ema_long2: usize,
    pub tema_period: usize,
    pub tema_smooth: usize,
    pub rsi_period: usize,
    pub rsi_smooth: usize,
    pub impulse_multiplier: Decimal,
    pub impulse_lookback: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_short: 11,
            ema_mid: 30,
            ema_long: 110,
            ema_long2: 200,
            tema_period: 9,
            tema_smooth: 10,
            rsi_period: 14,
            rsi_smooth: 20,
            impulse_multiplier: dec!(2.0),
            impulse_lookback: 10,
        }
    }
}

/// Compute every indicator column and assemble the bar series.
///
/// Candles must be ascending by open time (the engine re-validates). The RSI
/// columns land only on the bar whose open time equals a complete 2-hour
/// block start; all other bars keep them null.
pub fn enrich_candles(candles: &[Candle], params: &IndicatorParams) -> Vec<Bar> {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let hl2: Vec<Decimal> = candles
        .iter()
        .map(|c| round_half_up((c.high + c.low) / Decimal::TWO, INTERMEDIATE_DP))
        .collect();
    let bodies: Vec<Decimal> = candles.iter().map(|c| (c.close - c.open).abs()).collect();

    let ema_short = ema_series(&closes, params.ema_short);
    let ema_mid = ema_series(&closes, params.ema_mid);
    let ema_long = ema_series(&closes, params.ema_long);
    let ema_long2 = ema_series(&closes, params.ema_long2);
    let tema = smoothed_tema_series(&hl2, params.tema_period, params.tema_smooth);
    let impulse = impulse_flags(&bodies, params.impulse_multiplier, params.impulse_lookback);

    let points: Vec<(NaiveDateTime, Decimal)> =
        candles.iter().map(|c| (c.open_time, c.close)).collect();
    let groups = two_hour_closes(&points);
    let group_closes: Vec<Decimal> = groups.iter().map(|&(_, close)| close).collect();
    let rsi = rsi_series(&group_closes, params.rsi_period);
    let rsi_avg = sma_series(&rsi, params.rsi_smooth);

    let mut rsi_at: HashMap<NaiveDateTime, (Option<Decimal>, Option<Decimal>)> =
        HashMap::with_capacity(groups.len());
    for (i, &(key, _)) in groups.iter().enumerate() {
        rsi_at.insert(key, (rsi[i], rsi_avg[i]));
    }

    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (rsi_2h, rsi_2h_avg) = rsi_at
                .get(&c.open_time)
                .copied()
                .unwrap_or((None, None));
            Bar {
                open_time: c.open_time,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
                ema_short: ema_short[i],
                ema_mid: ema_mid[i],
                ema_long: ema_long[i],
                ema_long2: ema_long2[i],
                tema: tema[i],
                rsi_2h,
                rsi_2h_avg,
                impulse: impulse[i],
            }
        })
        .collect()
}
