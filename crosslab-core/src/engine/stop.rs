//! Geometric stop-loss resolver.
//!
//! A stop is anchored to the strongest impulse bar in a short lookback
//! window ending at the entry bar. The impulse body defines two zones on
//! the stop side of the trade: Zone A is the body half nearer the stop,
//! Zone B extends one half-height further out. EMA levels and cross-bar
//! midpoints falling inside Zone A (then Zone B) compete for the stop;
//! when the zones yield nothing the TEMA extreme over the window is the
//! stop of last resort. No level at all means no trade.

use rust_decimal::Decimal;

use crate::domain::{Bar, Side, StopSource};
use crate::engine::config::SimConfig;
use crate::math::{midpoint, round_half_up, within_relative_gap, INTERMEDIATE_DP};
use crate::signal::cross_at;

/// A resolved stop price with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStop {
    pub price: Decimal,
    pub source: StopSource,
    /// Whether the lookback window held an impulse bar at all. True even
    /// when the stop itself came from the TEMA fallback.
    pub impulse: bool,
}

/// Resolves the stop for an entry at `entry_index` in direction `side`.
///
/// Returns `None` when no level can be found anywhere in the window, in
/// which case the caller must discard the trigger.
pub fn resolve_stop(
    bars: &[Bar],
    entry_index: usize,
    side: Side,
    cfg: &SimConfig,
) -> Option<ResolvedStop> {
    let last = bars.len().checked_sub(1)?;
    let from = entry_index.saturating_sub(cfg.impulse_lookback);
    let to = entry_index.min(last);

    let Some(anchor_index) = strongest_impulse(bars, from, to) else {
        let price = tema_extreme(bars, from, to, side)?;
        return Some(ResolvedStop {
            price,
            source: StopSource::Tema,
            impulse: false,
        });
    };

    let anchor = &bars[anchor_index];
    let (body_low, body_high) = anchor.body_range();
    let body = body_high - body_low;
    if body <= Decimal::ZERO {
        let price = tema_extreme(bars, from, to, side)?;
        return Some(ResolvedStop {
            price,
            source: StopSource::Tema,
            impulse: true,
        });
    }

    let half = round_half_up(body / Decimal::TWO, INTERMEDIATE_DP);
    let mid = body_low + half;
    let (zone_a, zone_b) = match side {
        Side::Long => ((body_low, mid), (body_low - half, body_low)),
        Side::Short => ((mid, body_high), (body_high, body_high + half)),
    };

    let mut candidates = zone_candidates(bars, from, to, anchor, zone_a);
    if candidates.is_empty() {
        candidates = zone_candidates(bars, from, to, anchor, zone_b);
    }
    if candidates.is_empty() {
        let price = tema_extreme(bars, from, to, side)?;
        return Some(ResolvedStop {
            price,
            source: StopSource::Tema,
            impulse: true,
        });
    }

    let lowest = candidates.iter().map(|(level, _)| *level).min()?;
    let highest = candidates.iter().map(|(level, _)| *level).max()?;

    let collapsed = within_relative_gap(lowest, highest, cfg.equiv_tolerance);
    let price = match (side, collapsed) {
        // A cluster inside the tolerance is one effective level and a wide
        // spread is a real choice; both resolve to the stop-side extreme,
        // which is why near-duplicates never need a dedup pass.
        (Side::Long, _) => lowest,
        (Side::Short, _) => highest,
    };
    let source = candidates
        .iter()
        .find(|(level, _)| *level == price)
        .map(|(_, source)| *source)
        .unwrap_or(StopSource::Tema);

    Some(ResolvedStop {
        price,
        source,
        impulse: true,
    })
}

/// Index of the impulse-flagged bar with the largest body-to-open ratio in
/// `[from, to]`. Ties go to the more recent bar; bars with a zero open are
/// skipped.
fn strongest_impulse(bars: &[Bar], from: usize, to: usize) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (index, bar) in bars.iter().enumerate().take(to + 1).skip(from) {
        if !bar.impulse || bar.open.is_zero() {
            continue;
        }
        let Some(score) = (bar.close - bar.open)
            .abs()
            .checked_div(bar.open.abs())
            .map(|q| round_half_up(q, INTERMEDIATE_DP))
        else {
            continue;
        };
        // Forward scan, so `>=` hands ties to the more recent bar.
        if best.map_or(true, |(_, best_score)| score >= best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Zone-filtered stop candidates: the two long EMAs on the anchor bar plus
/// the short/mid midpoint at every cross bar (either direction) in the
/// window.
fn zone_candidates(
    bars: &[Bar],
    from: usize,
    to: usize,
    anchor: &Bar,
    zone: (Decimal, Decimal),
) -> Vec<(Decimal, StopSource)> {
    let mut out = Vec::new();
    push_if_in_zone(&mut out, anchor.ema_long, StopSource::LongEma, zone);
    push_if_in_zone(&mut out, anchor.ema_long2, StopSource::LongEma2, zone);
    for (index, bar) in bars.iter().enumerate().take(to + 1).skip(from.max(1)) {
        if cross_at(bars, index).is_none() {
            continue;
        }
        let level = bar
            .ema_short
            .zip(bar.ema_mid)
            .and_then(|(short, mid)| midpoint(short, mid));
        push_if_in_zone(&mut out, level, StopSource::CrossLevel, zone);
    }
    out
}

fn push_if_in_zone(
    dst: &mut Vec<(Decimal, StopSource)>,
    level: Option<Decimal>,
    source: StopSource,
    (lo, hi): (Decimal, Decimal),
) {
    if let Some(level) = level {
        if level >= lo && level <= hi {
            dst.push((level, source));
        }
    }
}

/// Stop of last resort: min (LONG) or max (SHORT) TEMA over the window.
fn tema_extreme(bars: &[Bar], from: usize, to: usize, side: Side) -> Option<Decimal> {
    let series = bars
        .iter()
        .take(to + 1)
        .skip(from)
        .filter_map(|bar| bar.tema);
    match side {
        Side::Long => series.min(),
        Side::Short => series.max(),
    }
}
