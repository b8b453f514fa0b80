//! Domain types for the crosslab engine.

pub mod bar;
pub mod side;
pub mod trade;

pub use bar::{first_ordering_violation, Bar};
pub use side::Side;
pub use trade::{ExitReason, PnlRow, Role, StopSource, TradeRecord};
