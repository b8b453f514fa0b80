//! Simulation configuration.
//!
//! Every tunable the engine reads lives on [`SimConfig`]; nothing is a
//! scattered constant. Defaults reproduce the plain production profile;
//! [`SimConfig::hedged`] enables the hedge companion and its lower sizing
//! fee term.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Where the sizer's risk budget comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskPolicy {
    /// The same budget for every trade.
    Fixed { amount: Decimal },
    /// `fraction` of running equity, recomputed at calendar month boundaries.
    /// A losing month cannot pull the budget below the last unlocked value.
    EquityFraction {
        fraction: Decimal,
        initial_equity: Decimal,
    },
}

/// Where the stop ratchets to once the partial take-profit banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakevenMode {
    /// Plain breakeven: the entry price.
    Entry,
    /// The price at which the whole trade nets to zero after fees.
    FeeAware,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Bar spacing; also the offset used for intrabar exit timestamps.
    pub bar_interval_minutes: i64,
    /// Fee term in the sizing denominator (round-trip rate on entry notional).
    pub fee_rate: Decimal,
    /// P&L fee per fill, applied to entry and exit notional.
    pub fee_per_side: Decimal,
    pub min_qty: Decimal,
    pub step_qty: Decimal,
    pub risk: RiskPolicy,
    /// Share of the quantity closed at the partial take-profit.
    pub partial_tp_fraction: Decimal,
    /// R-multiple of the partial take-profit target.
    pub partial_tp_r: Decimal,
    pub rsi_arm_high: Decimal,
    pub rsi_arm_low: Decimal,
    /// Relative gap under which stop candidates count as equivalent.
    pub equiv_tolerance: Decimal,
    pub cross_window_bars: usize,
    pub touch_window_bars: usize,
    /// How far back the stop resolver scans for its anchoring impulse bar.
    pub impulse_lookback: usize,
    /// Open an opposite-direction companion with every MAIN.
    pub hedge: bool,
    pub breakeven: BreakevenMode,
    pub price_scale: u32,
    pub qty_scale: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bar_interval_minutes: 30,
            fee_rate: dec!(0.0011),
            fee_per_side: dec!(0.00055),
            min_qty: dec!(0.001),
            step_qty: dec!(0.001),
            risk: RiskPolicy::Fixed { amount: dec!(100) },
            partial_tp_fraction: dec!(0.5),
            partial_tp_r: dec!(2),
            rsi_arm_high: dec!(75),
            rsi_arm_low: dec!(35),
            equiv_tolerance: dec!(0.0003),
            cross_window_bars: 2,
            touch_window_bars: 5,
            impulse_lookback: 5,
            hedge: false,
            breakeven: BreakevenMode::Entry,
            price_scale: 2,
            qty_scale: 3,
        }
    }
}

impl SimConfig {
    /// Hedge-companion profile: hedge on, the lower sizing fee term.
    pub fn hedged() -> Self {
        Self {
            fee_rate: dec!(0.0004),
            hedge: true,
            ..Self::default()
        }
    }

    pub fn bar_interval(&self) -> Duration {
        Duration::minutes(self.bar_interval_minutes)
    }
}
