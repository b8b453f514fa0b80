//! Simulation engine — the bar loop and its supporting pieces.
//!
//! A run consumes an enriched bar series and walks it once:
//!
//! 1. Start-of-bar: risk calendar roll, pending-entry activation
//! 2. Signals: cross/touch detection feeding the pairing windows
//! 3. Exits: the open pair walks the priority ladder
//! 4. Planning: a surviving trigger plans the next bar's entry
//!
//! Everything below the runner is a pure, separately testable function:
//! stop resolution, sizing, breakeven arithmetic, and P&L accounting.

pub mod accounting;
pub mod config;
pub mod risk;
pub mod runner;
pub mod sizing;
pub mod state;
pub mod stop;

pub use accounting::{fee_aware_breakeven, pnl_for_trade, pnl_rows};
pub use config::{BreakevenMode, RiskPolicy, SimConfig};
pub use risk::RiskTracker;
pub use runner::{run_backtest, SimError, SimReport, MIN_BARS};
pub use sizing::position_quantity;
pub use state::{
    loss_touch, profit_touch, split_tranches, HedgePosition, MainPosition, PendingEntry,
    SimulationState,
};
pub use stop::{resolve_stop, ResolvedStop};
