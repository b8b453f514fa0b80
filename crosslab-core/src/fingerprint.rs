//! Run fingerprinting.
//!
//! A run identity is the BLAKE3 hash of the canonical configuration JSON
//! plus the data window (bar count, first and last open time). Artifacts
//! stamped with the same fingerprint came from identical inputs.

use serde_json::json;

use crate::domain::Bar;
use crate::engine::SimConfig;

/// Deterministic identity for a run over `bars` under `cfg`.
pub fn run_fingerprint(bars: &[Bar], cfg: &SimConfig) -> String {
    // serde_json's default map is sorted, so the serialization is canonical.
    let canonical = json!({
        "config": cfg,
        "bar_count": bars.len(),
        "first_open": bars.first().map(|b| b.open_time.to_string()),
        "last_open": bars.last().map(|b| b.open_time.to_string()),
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(index: usize) -> Bar {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Bar {
            open_time: start + chrono::Duration::minutes(30 * index as i64),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100),
            ema_short: None,
            ema_mid: None,
            ema_long: None,
            ema_long2: None,
            tema: None,
            rsi_2h: None,
            rsi_2h_avg: None,
            impulse: false,
        }
    }

    #[test]
    fn identical_inputs_share_a_fingerprint() {
        let bars: Vec<Bar> = (0..20).map(bar).collect();
        let cfg = SimConfig::default();
        assert_eq!(run_fingerprint(&bars, &cfg), run_fingerprint(&bars, &cfg));
    }

    #[test]
    fn config_changes_the_fingerprint() {
        let bars: Vec<Bar> = (0..20).map(bar).collect();
        let a = run_fingerprint(&bars, &SimConfig::default());
        let b = run_fingerprint(&bars, &SimConfig::hedged());
        assert_ne!(a, b);
    }

    #[test]
    fn data_window_changes_the_fingerprint() {
        let cfg = SimConfig::default();
        let long: Vec<Bar> = (0..20).map(bar).collect();
        let short: Vec<Bar> = (0..19).map(bar).collect();
        assert_ne!(run_fingerprint(&long, &cfg), run_fingerprint(&short, &cfg));
    }

    #[test]
    fn fingerprint_is_hex_encoded_blake3() {
        let bars: Vec<Bar> = (0..20).map(bar).collect();
        let fp = run_fingerprint(&bars, &SimConfig::default());
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
