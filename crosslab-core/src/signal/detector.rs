//! Raw per-bar signals: short/mid EMA cross and long-EMA touch.
//!
//! Both detectors are pure. A missing indicator value makes the signal false
//! rather than an error; warmup bars simply never fire.

use crate::domain::{Bar, Side};

/// Cross of the short EMA through the mid EMA between two adjacent bars.
///
/// Up: short below mid on the previous bar, at-or-above on the current.
/// Down: the mirror. Equal values on the previous bar are not a cross.
pub fn cross_between(prev: &Bar, cur: &Bar) -> Option<Side> {
    let prev_short = prev.ema_short?;
    let prev_mid = prev.ema_mid?;
    let cur_short = cur.ema_short?;
    let cur_mid = cur.ema_mid?;

    if prev_short < prev_mid && cur_short >= cur_mid {
        return Some(Side::Long);
    }
    if prev_short > prev_mid && cur_short <= cur_mid {
        return Some(Side::Short);
    }
    None
}

/// Cross signal at bar `i`; needs the preceding bar, so `i == 0` never fires.
pub fn cross_at(bars: &[Bar], i: usize) -> Option<Side> {
    if i == 0 || i >= bars.len() {
        return None;
    }
    cross_between(&bars[i - 1], &bars[i])
}

/// True when the bar's range touches the long EMA (inclusive bounds).
pub fn touches_long_ema(bar: &Bar) -> bool {
    match bar.ema_long {
        Some(level) => bar.low <= level && level <= bar.high,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar_with_emas(short: Option<Decimal>, mid: Option<Decimal>) -> Bar {
        Bar {
            open_time: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100),
            ema_short: short,
            ema_mid: mid,
            ema_long: None,
            ema_long2: None,
            tema: None,
            rsi_2h: None,
            rsi_2h_avg: None,
            impulse: false,
        }
    }

    #[test]
    fn cross_up_detected() {
        let prev = bar_with_emas(Some(dec!(99)), Some(dec!(100)));
        let cur = bar_with_emas(Some(dec!(100)), Some(dec!(100)));
        assert_eq!(cross_between(&prev, &cur), Some(Side::Long));
    }

    #[test]
    fn cross_down_detected() {
        let prev = bar_with_emas(Some(dec!(101)), Some(dec!(100)));
        let cur = bar_with_emas(Some(dec!(99)), Some(dec!(100)));
        assert_eq!(cross_between(&prev, &cur), Some(Side::Short));
    }

    #[test]
    fn equal_previous_is_not_a_cross() {
        let prev = bar_with_emas(Some(dec!(100)), Some(dec!(100)));
        let cur = bar_with_emas(Some(dec!(101)), Some(dec!(100)));
        assert_eq!(cross_between(&prev, &cur), None);
    }

    #[test]
    fn missing_ema_never_fires() {
        let prev = bar_with_emas(None, Some(dec!(100)));
        let cur = bar_with_emas(Some(dec!(101)), Some(dec!(100)));
        assert_eq!(cross_between(&prev, &cur), None);
    }

    #[test]
    fn cross_at_zero_never_fires() {
        let bars = vec![bar_with_emas(Some(dec!(99)), Some(dec!(100)))];
        assert_eq!(cross_at(&bars, 0), None);
    }

    #[test]
    fn touch_bounds_inclusive() {
        let mut bar = bar_with_emas(None, None);
        bar.ema_long = Some(dec!(99));
        assert!(touches_long_ema(&bar)); // low == level

        bar.ema_long = Some(dec!(101));
        assert!(touches_long_ema(&bar)); // high == level

        bar.ema_long = Some(dec!(98.99));
        assert!(!touches_long_ema(&bar));

        bar.ema_long = None;
        assert!(!touches_long_ema(&bar));
    }
}
