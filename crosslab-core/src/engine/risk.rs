//! Risk budget tracking across the run.
//!
//! The fixed policy hands the sizer the same figure forever. The
//! equity-fraction policy recomputes `fraction * equity` at calendar month
//! boundaries, with one asymmetry: a losing month cannot pull the budget
//! below the last unlocked figure, while a breakeven-or-better month always
//! re-anchors it, downward included.

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;

use crate::engine::config::RiskPolicy;

#[derive(Debug, Clone)]
pub struct RiskTracker {
    policy: RiskPolicy,
    realized: Decimal,
    month_pnl: Decimal,
    current_month: Option<(i32, u32)>,
    unlocked: Decimal,
    budget: Decimal,
}

impl RiskTracker {
    pub fn new(policy: RiskPolicy) -> Self {
        let budget = match &policy {
            RiskPolicy::Fixed { amount } => *amount,
            RiskPolicy::EquityFraction {
                fraction,
                initial_equity,
            } => *fraction * *initial_equity,
        };
        Self {
            policy,
            realized: Decimal::ZERO,
            month_pnl: Decimal::ZERO,
            current_month: None,
            unlocked: budget,
            budget,
        }
    }

    /// Advances the calendar; rolls the budget when the month changes.
    pub fn on_bar(&mut self, open_time: NaiveDateTime) {
        let month = (open_time.year(), open_time.month());
        match self.current_month {
            None => self.current_month = Some(month),
            Some(current) if current != month => {
                self.roll_month();
                self.current_month = Some(month);
            }
            Some(_) => {}
        }
    }

    /// Books a closed row's net P&L against the running equity.
    pub fn record_net_pnl(&mut self, net: Decimal) {
        self.realized += net;
        self.month_pnl += net;
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    fn roll_month(&mut self) {
        if let RiskPolicy::EquityFraction {
            fraction,
            initial_equity,
        } = &self.policy
        {
            let candidate = *fraction * (*initial_equity + self.realized);
            if self.month_pnl < Decimal::ZERO {
                // A losing month never drags the budget under the last unlock.
                self.budget = candidate.max(self.unlocked);
            } else {
                self.budget = candidate;
                self.unlocked = candidate;
            }
        }
        self.month_pnl = Decimal::ZERO;
    }
}
