//! Signal pairing: two independent signal streams, one directional trigger.
//!
//! A cross opens a short-lived directional window; a touch opens a longer
//! non-directional one. A trigger fires when either signal lands while the
//! other kind's window is still live. Each kind holds at most one window and
//! a fresh signal restarts it, so on a bar where both fire the fresh cross's
//! direction decides. Any trigger consumes both windows, whether or not the
//! entry it proposes survives downstream stop and sizing checks.

use crate::domain::Side;

/// Directional entry event produced by the pairing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub side: Side,
    pub bar_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct CrossWindow {
    side: Side,
    deadline: usize,
}

/// Pairing window state. One per run; feed it every bar in order.
#[derive(Debug, Clone)]
pub struct PairingWindows {
    cross: Option<CrossWindow>,
    touch_deadline: Option<usize>,
    cross_bars: usize,
    touch_bars: usize,
}

impl PairingWindows {
    pub fn new(cross_bars: usize, touch_bars: usize) -> Self {
        Self {
            cross: None,
            touch_deadline: None,
            cross_bars,
            touch_bars,
        }
    }

    /// Feed bar `i`'s raw signals; returns the trigger, if any.
    ///
    /// A window is live through its deadline bar inclusive. Expiry happens
    /// before this bar's signals restart anything.
    pub fn observe(&mut self, i: usize, cross: Option<Side>, touch: bool) -> Option<Trigger> {
        if self.cross.is_some_and(|w| i > w.deadline) {
            self.cross = None;
        }
        if self.touch_deadline.is_some_and(|deadline| i > deadline) {
            self.touch_deadline = None;
        }

        if let Some(side) = cross {
            self.cross = Some(CrossWindow {
                side,
                deadline: i + self.cross_bars,
            });
        }
        if touch {
            self.touch_deadline = Some(i + self.touch_bars);
        }

        let trigger = if touch {
            self.cross.map(|w| Trigger {
                side: w.side,
                bar_index: i,
            })
        } else if self.touch_deadline.is_some() {
            cross.map(|side| Trigger { side, bar_index: i })
        } else {
            None
        };

        if trigger.is_some() {
            self.cross = None;
            self.touch_deadline = None;
        }
        trigger
    }
}
