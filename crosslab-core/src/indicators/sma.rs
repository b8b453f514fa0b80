//! Simple Moving Average over a null-carrying series.
//!
//! Sliding-sum form: a null input emits null and leaves the running sum
//! untouched (no add, no subtract), and a null leaving the window subtracts
//! zero. Values emit from index `period - 1` onward regardless of how many
//! nulls the window holds, so nulls inside the window weigh as zero. This is
//! the exact rule the rest of the pipeline (TEMA smoothing, RSI average) is
//! calibrated against.

use crate::math::div10;
use rust_decimal::Decimal;

/// SMA of `values` with the sliding rule above. `period == 0` yields all-null.
pub fn sma_series(values: &[Option<Decimal>], period: usize) -> Vec<Option<Decimal>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let divisor = Decimal::from(period as u64);
    let mut sum = Decimal::ZERO;

    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else {
            out.push(None);
            continue;
        };

        sum += v;
        if i >= period {
            if let Some(old) = values[i - period] {
                sum -= old;
            }
        }

        if i >= period - 1 {
            out.push(div10(sum, divisor));
        } else {
            out.push(None);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::opt_series;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_3_known_values() {
        let values = opt_series(&["10", "11", "12", "13", "14"]);
        let result = sma_series(&values, 3);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(dec!(11.0000000000)));
        assert_eq!(result[3], Some(dec!(12.0000000000)));
        assert_eq!(result[4], Some(dec!(13.0000000000)));
    }

    #[test]
    fn leading_nulls_weigh_as_zero() {
        // Nulls at 0..=1, values from 2: window at index 2 is {0, 0, 12}.
        let values = vec![None, None, Some(dec!(12)), Some(dec!(15))];
        let result = sma_series(&values, 3);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(dec!(4.0000000000)));
        assert_eq!(result[3], Some(dec!(9.0000000000)));
    }

    #[test]
    fn null_step_skips_its_subtraction() {
        // The null at index 2 performs no subtraction, so the value from
        // index 0 lingers in the sum: index 3 emits (3 + 6 - 6 + 9) / 2.
        let values = vec![Some(dec!(3)), Some(dec!(6)), None, Some(dec!(9))];
        let result = sma_series(&values, 2);
        assert_eq!(result[1], Some(dec!(4.5000000000)));
        assert_eq!(result[2], None);
        assert_eq!(result[3], Some(dec!(6.0000000000)));
    }

    #[test]
    fn zero_period_is_all_null() {
        let values = opt_series(&["1", "2"]);
        assert_eq!(sma_series(&values, 0), vec![None, None]);
    }
}
