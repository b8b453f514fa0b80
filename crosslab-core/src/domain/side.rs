//! Trade direction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a position or entry trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Price move from `entry` to `exit` signed in this side's favor:
    /// positive when the move is profitable for the side.
    pub fn favorable_move(self, entry: Decimal, exit: Decimal) -> Decimal {
        match self {
            Side::Long => exit - entry,
            Side::Short => entry - exit,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}
