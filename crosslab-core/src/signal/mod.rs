//! Signal detection and pairing.

pub mod detector;
pub mod windows;

pub use detector::{cross_at, cross_between, touches_long_ema};
pub use windows::{PairingWindows, Trigger};

use crate::domain::Bar;

/// Run detection and pairing over a whole series, collecting every trigger.
///
/// Diagnostic view of the entry stream; the engine runs the same state
/// machine inline so triggers can interact with the open position.
pub fn collect_triggers(bars: &[Bar], cross_bars: usize, touch_bars: usize) -> Vec<Trigger> {
    let mut windows = PairingWindows::new(cross_bars, touch_bars);
    let mut out = Vec::new();
    for i in 0..bars.len() {
        let cross = cross_at(bars, i);
        let touch = touches_long_ema(&bars[i]);
        if let Some(trigger) = windows.observe(i, cross, touch) {
            out.push(trigger);
        }
    }
    out
}
