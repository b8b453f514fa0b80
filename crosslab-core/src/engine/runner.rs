//! Bar-by-bar simulation loop.
//!
//! Each bar passes through four phases:
//!
//! 1. Start-of-bar: roll the risk calendar, fill a pending entry at the open
//! 2. Signals: EMA cross / long-EMA touch feed the pairing windows
//! 3. Exits: the open pair walks the priority ladder, first match wins
//! 4. Planning: a surviving trigger plans an entry at the next bar's open
//!
//! The loop is purely sequential and owns all of its state; a run is a
//! deterministic function of the bar series and the configuration.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{
    first_ordering_violation, Bar, ExitReason, PnlRow, Role, Side, TradeRecord,
};
use crate::engine::accounting::{fee_aware_breakeven, pnl_for_trade};
use crate::engine::config::{BreakevenMode, SimConfig};
use crate::engine::risk::RiskTracker;
use crate::engine::sizing::position_quantity;
use crate::engine::state::{
    loss_touch, profit_touch, split_tranches, HedgePosition, MainPosition, PendingEntry,
    SimulationState,
};
use crate::engine::stop::resolve_stop;
use crate::math::round_half_up;
use crate::signal::{cross_at, touches_long_ema, PairingWindows, Trigger};

/// Fewer bars than this produces an empty report with a warning, not an error.
pub const MIN_BARS: usize = 10;

/// Precondition failures that reject the whole run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("bar open times must be strictly ascending (violation at index {index})")]
    UnorderedBars { index: usize },
}

/// Result of a complete simulation run.
#[derive(Debug, Default)]
pub struct SimReport {
    /// Closed rows in the order they were booked.
    pub trades: Vec<TradeRecord>,
    /// P&L per row, parallel to `trades`.
    pub pnl: Vec<PnlRow>,
    /// Non-fatal conditions observed during the run.
    pub warnings: Vec<String>,
}

/// Runs the simulation over `bars` and returns the booked trades.
///
/// Bars must be strictly ascending by open time; anything else rejects the
/// run. A series shorter than [`MIN_BARS`] yields an empty report.
pub fn run_backtest(bars: &[Bar], cfg: &SimConfig) -> Result<SimReport, SimError> {
    if let Some(index) = first_ordering_violation(bars) {
        return Err(SimError::UnorderedBars { index });
    }
    if bars.len() < MIN_BARS {
        return Ok(SimReport {
            warnings: vec![format!(
                "{} bars is below the {MIN_BARS}-bar minimum; nothing simulated",
                bars.len()
            )],
            ..SimReport::default()
        });
    }

    let mut run = SimRun::new(bars, cfg);
    for index in 0..bars.len() {
        run.step(index);
    }
    Ok(run.into_report())
}

struct SimRun<'a> {
    bars: &'a [Bar],
    cfg: &'a SimConfig,
    state: SimulationState,
    windows: PairingWindows,
    risk: RiskTracker,
    trades: Vec<TradeRecord>,
    pnl: Vec<PnlRow>,
    next_pair_id: u64,
}

impl<'a> SimRun<'a> {
    fn new(bars: &'a [Bar], cfg: &'a SimConfig) -> Self {
        Self {
            bars,
            cfg,
            state: SimulationState::default(),
            windows: PairingWindows::new(cfg.cross_window_bars, cfg.touch_window_bars),
            risk: RiskTracker::new(cfg.risk.clone()),
            trades: Vec::new(),
            pnl: Vec::new(),
            next_pair_id: 1,
        }
    }

    fn step(&mut self, index: usize) {
        let bar = &self.bars[index];
        self.risk.on_bar(bar.open_time);

        // ─── Phase 1: Start-of-bar ───
        self.activate_pending(index);

        // ─── Phase 2: Signals ───
        let cross = cross_at(self.bars, index);
        let touch = touches_long_ema(bar);
        let trigger = self.windows.observe(index, cross, touch);

        // ─── Phase 3: Exits ───
        match std::mem::take(&mut self.state) {
            SimulationState::Open { main, hedge } => {
                self.state = self.manage_pair(index, main, hedge, trigger);
            }
            other => self.state = other,
        }

        // ─── Phase 4: Planning ───
        if self.state.is_idle() {
            if let Some(trigger) = trigger {
                self.plan_entry(index, trigger);
            }
        }
    }

    /// Fills a pending entry whose target bar has arrived.
    fn activate_pending(&mut self, index: usize) {
        let due = matches!(&self.state, SimulationState::Pending(p) if p.target_index == index);
        if !due {
            return;
        }
        let SimulationState::Pending(pending) = std::mem::take(&mut self.state) else {
            return;
        };

        let bar = &self.bars[index];
        let (tranche1, tranche2) = split_tranches(
            pending.quantity,
            self.cfg.partial_tp_fraction,
            self.cfg.step_qty,
        );
        let main = MainPosition {
            side: pending.side,
            pair_id: pending.pair_id,
            entry_price: pending.entry_price,
            entry_time: bar.open_time,
            entry_index: index,
            stop: pending.stop_price,
            initial_stop: pending.stop_price,
            stop_source: pending.stop_source,
            impulse: pending.impulse,
            quantity: pending.quantity,
            tranche1,
            tranche2,
            tp1_done: false,
            tp1_price: None,
            armed_high: false,
            armed_low: false,
        };
        let hedge = self.cfg.hedge.then(|| {
            let risk = main.initial_risk();
            let stop = match main.side {
                Side::Long => main.entry_price + risk,
                Side::Short => main.entry_price - risk,
            };
            HedgePosition {
                side: main.side.opposite(),
                pair_id: main.pair_id,
                entry_price: main.entry_price,
                entry_time: main.entry_time,
                quantity: main.quantity,
                tp: main.initial_stop,
                stop: round_half_up(stop, self.cfg.price_scale),
                stop_source: main.stop_source,
                impulse: main.impulse,
            }
        });
        self.state = SimulationState::Open { main, hedge };
    }

    /// Walks the exit priority ladder for the open pair. The first slot that
    /// fires consumes the bar.
    fn manage_pair(
        &mut self,
        index: usize,
        mut main: MainPosition,
        mut hedge: Option<HedgePosition>,
        trigger: Option<Trigger>,
    ) -> SimulationState {
        let bar = &self.bars[index];
        let exit_time = bar.open_time + self.cfg.bar_interval();

        // 1. MAIN stop. The hedge books at the same price: at its own TP
        //    when the stop never moved, as a paired close otherwise.
        if loss_touch(bar, main.side, main.stop) {
            let reason = if main.tp1_done {
                ExitReason::PartialTpOnly
            } else {
                ExitReason::StopLoss
            };
            let exit_price = round_half_up(main.stop, self.cfg.price_scale);
            self.record_main(&main, exit_time, exit_price, reason);
            if let Some(h) = hedge {
                let reason = if h.tp == main.stop {
                    ExitReason::HedgeTpAtMainStop
                } else {
                    ExitReason::PairCloseWithMain
                };
                self.record_hedge(&h, exit_time, exit_price, reason);
            }
            return SimulationState::Idle;
        }

        // 2. Hedge take-profit, then hedge stop. Either leaves MAIN open.
        if let Some(h) = hedge.take() {
            if profit_touch(bar, h.side, h.tp) {
                let exit_price = round_half_up(h.tp, self.cfg.price_scale);
                self.record_hedge(&h, exit_time, exit_price, ExitReason::HedgeTpAtMainStop);
                return SimulationState::Open { main, hedge: None };
            }
            if loss_touch(bar, h.side, h.stop) {
                let exit_price = round_half_up(h.stop, self.cfg.price_scale);
                self.record_hedge(&h, exit_time, exit_price, ExitReason::HedgeStop1R);
                return SimulationState::Open { main, hedge: None };
            }
            hedge = Some(h);
        }

        // 3. Partial take-profit ratchets the stop to breakeven.
        if !main.tp1_done && main.tranche1 > Decimal::ZERO {
            let risk = main.initial_risk();
            let target = match main.side {
                Side::Long => main.entry_price + self.cfg.partial_tp_r * risk,
                Side::Short => main.entry_price - self.cfg.partial_tp_r * risk,
            };
            if profit_touch(bar, main.side, target) {
                let tp1_price = round_half_up(target, self.cfg.price_scale);
                main.tp1_done = true;
                main.tp1_price = Some(tp1_price);
                let breakeven = match self.cfg.breakeven {
                    BreakevenMode::Entry => main.entry_price,
                    BreakevenMode::FeeAware => fee_aware_breakeven(
                        main.side,
                        main.entry_price,
                        tp1_price,
                        main.tranche1,
                        main.tranche2,
                        self.cfg.fee_per_side,
                    )
                    .unwrap_or(main.entry_price),
                };
                main.ratchet_stop(round_half_up(breakeven, self.cfg.price_scale));
                return SimulationState::Open { main, hedge };
            }
        }

        // 4. Reversal: an opposite trigger closes the pair at this bar's
        //    close. The trigger itself survives into the planning phase.
        if let Some(trigger) = trigger {
            if trigger.side != main.side {
                let exit_price = round_half_up(bar.close, self.cfg.price_scale);
                self.record_main(&main, exit_time, exit_price, ExitReason::ReversalClose);
                if let Some(h) = hedge {
                    self.record_hedge(&h, exit_time, exit_price, ExitReason::PairCloseWithMain);
                }
                return SimulationState::Idle;
            }
        }

        // 5. RSI exit, only on two-hour boundaries with a full 2h lookback.
        if index >= 4 && bar.is_two_hour_boundary() {
            if let Some(reason) = rsi_exit(&mut main, &self.bars[index - 4], bar, self.cfg) {
                let exit_price = round_half_up(bar.close, self.cfg.price_scale);
                self.record_main(&main, exit_time, exit_price, reason);
                if let Some(h) = hedge {
                    self.record_hedge(&h, exit_time, exit_price, ExitReason::PairCloseWithMain);
                }
                return SimulationState::Idle;
            }
        }

        SimulationState::Open { main, hedge }
    }

    /// Plans an entry at the next bar's open from a fresh trigger.
    fn plan_entry(&mut self, index: usize, trigger: Trigger) {
        let target_index = index + 1;
        let Some(entry_bar) = self.bars.get(target_index) else {
            return;
        };
        let Some(resolved) = resolve_stop(self.bars, target_index, trigger.side, self.cfg) else {
            return;
        };

        let entry_price = round_half_up(entry_bar.open, self.cfg.price_scale);
        let stop_price = round_half_up(resolved.price, self.cfg.price_scale);
        let quantity = position_quantity(entry_price, stop_price, self.risk.budget(), self.cfg);
        if quantity <= Decimal::ZERO {
            return;
        }

        self.state = SimulationState::Pending(PendingEntry {
            side: trigger.side,
            target_index,
            entry_price,
            stop_price,
            stop_source: resolved.source,
            impulse: resolved.impulse,
            quantity,
            pair_id: self.next_pair_id,
        });
        self.next_pair_id += 1;
    }

    fn record_main(
        &mut self,
        main: &MainPosition,
        exit_time: NaiveDateTime,
        exit_price: Decimal,
        reason: ExitReason,
    ) {
        self.push_trade(TradeRecord {
            pair_id: main.pair_id,
            role: Role::Main,
            side: main.side,
            entry_time: main.entry_time,
            entry_price: main.entry_price,
            stop_price: main.initial_stop,
            stop_source: main.stop_source,
            impulse: main.impulse,
            quantity: round_half_up(main.quantity, self.cfg.qty_scale),
            tp1_price: main.tp1_price,
            exit_time,
            exit_price,
            reason,
        });
    }

    fn record_hedge(
        &mut self,
        hedge: &HedgePosition,
        exit_time: NaiveDateTime,
        exit_price: Decimal,
        reason: ExitReason,
    ) {
        self.push_trade(TradeRecord {
            pair_id: hedge.pair_id,
            role: Role::Hedge,
            side: hedge.side,
            entry_time: hedge.entry_time,
            entry_price: hedge.entry_price,
            stop_price: hedge.stop,
            stop_source: hedge.stop_source,
            impulse: hedge.impulse,
            quantity: round_half_up(hedge.quantity, self.cfg.qty_scale),
            tp1_price: None,
            exit_time,
            exit_price,
            reason,
        });
    }

    fn push_trade(&mut self, trade: TradeRecord) {
        let pnl = pnl_for_trade(&trade, self.cfg);
        self.risk.record_net_pnl(pnl.net);
        self.trades.push(trade);
        self.pnl.push(pnl);
    }

    fn into_report(self) -> SimReport {
        SimReport {
            trades: self.trades,
            pnl: self.pnl,
            warnings: Vec::new(),
        }
    }
}

/// RSI exit decision on a two-hour boundary bar.
///
/// Arms the extreme latch first, then checks the adverse cross against the
/// reading four bars back and the armed-then-receding pattern. The cross
/// reason wins when both fire on the same bar.
fn rsi_exit(
    main: &mut MainPosition,
    prev: &Bar,
    bar: &Bar,
    cfg: &SimConfig,
) -> Option<ExitReason> {
    let (prev_rsi, prev_avg) = prev.rsi_2h.zip(prev.rsi_2h_avg)?;
    let (rsi, avg) = bar.rsi_2h.zip(bar.rsi_2h_avg)?;

    match main.side {
        Side::Long => {
            if !main.armed_high && rsi >= cfg.rsi_arm_high {
                main.armed_high = true;
            }
            let crossed_down = prev_rsi > prev_avg && rsi <= avg;
            let receded = main.armed_high && rsi < cfg.rsi_arm_high;
            if crossed_down {
                Some(ExitReason::RsiCross)
            } else if receded {
                Some(ExitReason::RsiExtreme)
            } else {
                None
            }
        }
        Side::Short => {
            if !main.armed_low && rsi <= cfg.rsi_arm_low {
                main.armed_low = true;
            }
            let crossed_up = prev_rsi < prev_avg && rsi >= avg;
            let receded = main.armed_low && rsi > cfg.rsi_arm_low;
            if crossed_up {
                Some(ExitReason::RsiCross)
            } else if receded {
                Some(ExitReason::RsiExtreme)
            } else {
                None
            }
        }
    }
}
