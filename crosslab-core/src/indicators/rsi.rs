//! Relative Strength Index on 2-hour closes.
//!
//! Wilder smoothing over close-to-close changes. The averages seed by plain
//! mean over the first `period` changes and the first value emits at index
//! `period + 1`; that bar's own change is excluded from the seeded averages.
//! A zero average loss caps RS at 100 (RSI ~= 99.01, not 100).
//!
//! The 30m-to-2h aggregation lives here too: bars grouped by their 2-hour
//! block start, incomplete blocks dropped.

use crate::math::{round_half_up, INTERMEDIATE_DP};
use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Bars per complete 2-hour block at the 30-minute interval.
const FULL_GROUP: usize = 4;

/// Wilder RSI; null through index `period`, values from `period + 1`.
pub fn rsi_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < 2 {
        return out;
    }

    let divisor = Decimal::from(period as u64);
    let mut avg_gain = Decimal::ZERO;
    let mut avg_loss = Decimal::ZERO;
    let mut prev_close = values[0];

    for i in 1..n {
        let change = values[i] - prev_close;
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);

        if i <= period {
            avg_gain += gain;
            avg_loss += loss;
        } else if i == period + 1 {
            avg_gain = round_half_up(avg_gain / divisor, INTERMEDIATE_DP);
            avg_loss = round_half_up(avg_loss / divisor, INTERMEDIATE_DP);
            out[i] = Some(rsi_value(avg_gain, avg_loss));
        } else {
            let smoothed = divisor - Decimal::ONE;
            avg_gain = round_half_up((avg_gain * smoothed + gain) / divisor, INTERMEDIATE_DP);
            avg_loss = round_half_up((avg_loss * smoothed + loss) / divisor, INTERMEDIATE_DP);
            out[i] = Some(rsi_value(avg_gain, avg_loss));
        }

        prev_close = values[i];
    }

    out
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    let hundred = dec!(100);
    let rs = if avg_loss.is_zero() {
        hundred
    } else {
        round_half_up(avg_gain / avg_loss, INTERMEDIATE_DP)
    };
    hundred - round_half_up(hundred / (Decimal::ONE + rs), INTERMEDIATE_DP)
}

/// Floor a timestamp to the start of its 2-hour block (UTC).
pub fn floor_to_two_hours(t: NaiveDateTime) -> NaiveDateTime {
    t - chrono::Duration::hours(i64::from(t.hour() % 2))
        - chrono::Duration::minutes(i64::from(t.minute()))
        - chrono::Duration::seconds(i64::from(t.second()))
        - chrono::Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// Collapse ascending (open time, close) points into 2-hour groups keyed by
/// block start, keeping each group's last close. Groups with fewer than
/// [`FULL_GROUP`] members are dropped as incomplete.
pub fn two_hour_closes(points: &[(NaiveDateTime, Decimal)]) -> Vec<(NaiveDateTime, Decimal)> {
    let mut out = Vec::new();
    let mut current: Option<(NaiveDateTime, Decimal, usize)> = None;

    for &(t, close) in points {
        let key = floor_to_two_hours(t);
        match current {
            Some((cur_key, _, count)) if cur_key == key => {
                current = Some((cur_key, close, count + 1));
            }
            Some((cur_key, last, count)) => {
                if count >= FULL_GROUP {
                    out.push((cur_key, last));
                }
                current = Some((key, close, 1));
            }
            None => {
                current = Some((key, close, 1));
            }
        }
    }

    if let Some((key, last, count)) = current {
        if count >= FULL_GROUP {
            out.push((key, last));
        }
    }

    out
}
