//! TradeRecord — a completed round-trip trade with full traceability.

use super::side::Side;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which leg of a pair this record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Main,
    Hedge,
}

/// Why a position closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Protective stop hit before any partial take-profit.
    StopLoss,
    /// Stop hit after the partial take-profit already banked.
    PartialTpOnly,
    /// RSI crossed its average adversely on a 2-hour boundary bar.
    RsiCross,
    /// Armed RSI extreme receded back through its threshold.
    RsiExtreme,
    /// An opposite-direction entry trigger closed the position.
    ReversalClose,
    /// Hedge take-profit, positioned at MAIN's initial stop level.
    HedgeTpAtMainStop,
    /// Hedge's own 1R stop hit.
    #[serde(rename = "HEDGE_STOP_1R")]
    HedgeStop1R,
    /// Hedge force-closed because MAIN closed.
    PairCloseWithMain,
}

/// Which candidate family produced the stop price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopSource {
    /// TEMA fallback (window min/max).
    Tema,
    /// Long EMA at the impulse bar.
    LongEma,
    /// Second long EMA at the impulse bar.
    LongEma2,
    /// Short/mid EMA midpoint at a cross bar.
    CrossLevel,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::PartialTpOnly => "PARTIAL_TP_ONLY",
            ExitReason::RsiCross => "RSI_CROSS",
            ExitReason::RsiExtreme => "RSI_EXTREME",
            ExitReason::ReversalClose => "REVERSAL_CLOSE",
            ExitReason::HedgeTpAtMainStop => "HEDGE_TP_AT_MAIN_STOP",
            ExitReason::HedgeStop1R => "HEDGE_STOP_1R",
            ExitReason::PairCloseWithMain => "PAIR_CLOSE_WITH_MAIN",
        };
        f.write_str(s)
    }
}

impl fmt::Display for StopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopSource::Tema => "TEMA",
            StopSource::LongEma => "LONG_EMA",
            StopSource::LongEma2 => "LONG_EMA2",
            StopSource::CrossLevel => "CROSS_LEVEL",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Main => "MAIN",
            Role::Hedge => "HEDGE",
        })
    }
}

/// A complete round-trip trade: entry → exit, with the risk state it carried.
///
/// Records are appended in close order. In hedge mode a MAIN and its hedge
/// share a `pair_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub pair_id: u64,
    pub role: Role,
    pub side: Side,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: Decimal,

    // ── Risk ──
    /// Initial protective stop (a hedge row carries its own 1R stop here).
    pub stop_price: Decimal,
    pub stop_source: StopSource,
    /// An impulse bar anchored the stop zones.
    pub impulse: bool,

    // ── Size ──
    pub quantity: Decimal,

    // ── Partial take-profit ──
    /// Fill price of the first tranche, when the partial TP banked.
    pub tp1_price: Option<Decimal>,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: Decimal,
    pub reason: ExitReason,
}

impl TradeRecord {
    /// Favorable price move from entry to exit (sign carries win/loss).
    pub fn price_move(&self) -> Decimal {
        self.side.favorable_move(self.entry_price, self.exit_price)
    }
}

/// Per-trade realized P&L figures, price-scale rounded.
///
/// `partial_pnl` is zero for trades without a banked partial TP (hedge rows
/// included); `net = partial_pnl + remainder_pnl - fees` holds at scale 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlRow {
    pub partial_pnl: Decimal,
    pub remainder_pnl: Decimal,
    pub fees: Decimal,
    pub net: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            pair_id: 1,
            role: Role::Main,
            side: Side::Long,
            entry_time: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            entry_price: dec!(100.00),
            stop_price: dec!(98.00),
            stop_source: StopSource::LongEma,
            impulse: true,
            quantity: dec!(0.500),
            tp1_price: Some(dec!(104.00)),
            exit_time: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            exit_price: dec!(100.00),
            reason: ExitReason::PartialTpOnly,
        }
    }

    #[test]
    fn price_move_signs() {
        let mut trade = sample_trade();
        trade.exit_price = dec!(103.00);
        assert_eq!(trade.price_move(), dec!(3.00));

        trade.side = Side::Short;
        assert_eq!(trade.price_move(), dec!(-3.00));
    }

    #[test]
    fn reason_display_matches_serde() {
        for reason in [
            ExitReason::StopLoss,
            ExitReason::PartialTpOnly,
            ExitReason::RsiCross,
            ExitReason::RsiExtreme,
            ExitReason::ReversalClose,
            ExitReason::HedgeTpAtMainStop,
            ExitReason::HedgeStop1R,
            ExitReason::PairCloseWithMain,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{reason}\""));
        }
        let json = serde_json::to_string(&StopSource::CrossLevel).unwrap();
        assert_eq!(json, format!("\"{}\"", StopSource::CrossLevel));
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
