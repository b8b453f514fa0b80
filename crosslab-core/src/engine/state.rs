//! Simulation state machine.
//!
//! The engine is always in exactly one of three states: flat, holding a
//! planned entry for the next bar's open, or holding an open MAIN position
//! with an optional hedge companion. Transitions only happen inside the
//! bar loop, so every field here is plain data with no interior mutability.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::{Bar, Side, StopSource};
use crate::math::floor_to_step;

/// An entry planned on the trigger bar, to be filled at the next bar's open.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub side: Side,
    /// Index of the bar whose open fills the entry.
    pub target_index: usize,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub stop_source: StopSource,
    pub impulse: bool,
    pub quantity: Decimal,
    pub pair_id: u64,
}

/// The directional position the strategy actually wants.
#[derive(Debug, Clone, PartialEq)]
pub struct MainPosition {
    pub side: Side,
    pub pair_id: u64,

    // ── Entry ──
    pub entry_price: Decimal,
    pub entry_time: NaiveDateTime,
    pub entry_index: usize,

    // ── Risk ──
    /// Current stop, ratcheted over the position's life.
    pub stop: Decimal,
    /// Stop at entry; the R unit is derived from this one, never the ratchet.
    pub initial_stop: Decimal,
    pub stop_source: StopSource,
    pub impulse: bool,

    // ── Size ──
    pub quantity: Decimal,
    pub tranche1: Decimal,
    pub tranche2: Decimal,

    // ── Partial take-profit ──
    pub tp1_done: bool,
    pub tp1_price: Option<Decimal>,

    // ── RSI exit latches ──
    pub armed_high: bool,
    pub armed_low: bool,
}

impl MainPosition {
    /// Per-unit risk taken at entry. This is the R unit for targets.
    pub fn initial_risk(&self) -> Decimal {
        (self.entry_price - self.initial_stop).abs()
    }

    /// Moves the stop toward profit, never away from it.
    pub fn ratchet_stop(&mut self, candidate: Decimal) {
        self.stop = match self.side {
            Side::Long => candidate.max(self.stop),
            Side::Short => candidate.min(self.stop),
        };
    }
}

/// Opposite-direction companion opened atomically with a MAIN entry.
///
/// Its take-profit sits at MAIN's initial stop and its own stop sits 1R
/// beyond its entry, so it pays out exactly when MAIN's protection fails.
#[derive(Debug, Clone, PartialEq)]
pub struct HedgePosition {
    pub side: Side,
    pub pair_id: u64,
    pub entry_price: Decimal,
    pub entry_time: NaiveDateTime,
    pub quantity: Decimal,
    pub tp: Decimal,
    pub stop: Decimal,
    /// Provenance mirrors MAIN's stop; the hedge has no resolver of its own.
    pub stop_source: StopSource,
    pub impulse: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SimulationState {
    #[default]
    Idle,
    Pending(PendingEntry),
    Open {
        main: MainPosition,
        hedge: Option<HedgePosition>,
    },
}

impl SimulationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SimulationState::Idle)
    }
}

/// Did this bar's range reach a profit-side level?
pub fn profit_touch(bar: &Bar, side: Side, level: Decimal) -> bool {
    match side {
        Side::Long => bar.high >= level,
        Side::Short => bar.low <= level,
    }
}

/// Did this bar's range reach a loss-side level?
pub fn loss_touch(bar: &Bar, side: Side, level: Decimal) -> bool {
    match side {
        Side::Long => bar.low <= level,
        Side::Short => bar.high >= level,
    }
}

/// Splits a filled quantity into the partial-TP tranche and the remainder.
///
/// Anything under two steps cannot be split and rides whole; otherwise the
/// first tranche is `fraction` of the quantity floored to the step.
pub fn split_tranches(
    quantity: Decimal,
    fraction: Decimal,
    step: Decimal,
) -> (Decimal, Decimal) {
    if quantity < step * Decimal::TWO {
        return (Decimal::ZERO, quantity);
    }
    let tranche1 = floor_to_step(quantity * fraction, step);
    (tranche1, quantity - tranche1)
}
