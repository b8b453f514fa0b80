//! Run artifacts — JSON manifest and CSV exports.
//!
//! Each run saves into its own directory under the output root:
//! - `manifest.json` — config, fingerprint, summary, and the full trade tape
//! - `trades.csv` — one row per closed trade with its P&L figures
//!
//! Persisted manifests carry a `schema_version` field; unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use crosslab_core::domain::{Bar, PnlRow, Role, TradeRecord};
use crosslab_core::engine::SimReport;
use crosslab_core::fingerprint::run_fingerprint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything worth keeping from a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 identity of the config and data window.
    pub fingerprint: String,
    pub config: RunConfig,
    pub summary: RunSummary,
    pub trades: Vec<TradeRecord>,
    /// P&L per trade, parallel to `trades`.
    pub pnl: Vec<PnlRow>,
    pub warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Aggregate figures for the summary printout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bar_count: usize,
    pub first_open: Option<NaiveDateTime>,
    pub last_open: Option<NaiveDateTime>,
    pub trade_count: usize,
    pub main_count: usize,
    pub hedge_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_net: Decimal,
    pub total_fees: Decimal,
    pub best_net: Decimal,
    pub worst_net: Decimal,
}

impl RunSummary {
    fn from_report(bars: &[Bar], report: &SimReport) -> Self {
        let mut wins = 0;
        let mut losses = 0;
        let mut total_net = Decimal::ZERO;
        let mut total_fees = Decimal::ZERO;
        let mut best_net = Decimal::ZERO;
        let mut worst_net = Decimal::ZERO;
        for row in &report.pnl {
            if row.net > Decimal::ZERO {
                wins += 1;
            } else {
                losses += 1;
            }
            total_net += row.net;
            total_fees += row.fees;
            best_net = best_net.max(row.net);
            worst_net = worst_net.min(row.net);
        }
        let main_count = report
            .trades
            .iter()
            .filter(|t| t.role == Role::Main)
            .count();

        Self {
            bar_count: bars.len(),
            first_open: bars.first().map(|b| b.open_time),
            last_open: bars.last().map(|b| b.open_time),
            trade_count: report.trades.len(),
            main_count,
            hedge_count: report.trades.len() - main_count,
            wins,
            losses,
            total_net,
            total_fees,
            best_net,
            worst_net,
        }
    }
}

/// Assemble the manifest for a completed run.
pub fn build_manifest(config: &RunConfig, bars: &[Bar], report: &SimReport) -> RunManifest {
    RunManifest {
        schema_version: SCHEMA_VERSION,
        fingerprint: run_fingerprint(bars, &config.simulation),
        config: config.clone(),
        summary: RunSummary::from_report(bars, report),
        trades: report.trades.clone(),
        pnl: report.pnl.clone(),
        warnings: report.warnings.clone(),
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a manifest to pretty JSON.
pub fn export_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize run manifest to JSON")
}

/// Deserialize a manifest from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize run manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Export the trade tape as CSV, one row per closed trade with its P&L.
///
/// Columns: pair_id, role, side, entry_time, entry_price, stop_price,
/// stop_source, impulse, quantity, tp1_price, exit_time, exit_price, reason,
/// partial_pnl, remainder_pnl, fees, net
pub fn export_trades_csv(trades: &[TradeRecord], pnl: &[PnlRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "pair_id",
        "role",
        "side",
        "entry_time",
        "entry_price",
        "stop_price",
        "stop_source",
        "impulse",
        "quantity",
        "tp1_price",
        "exit_time",
        "exit_price",
        "reason",
        "partial_pnl",
        "remainder_pnl",
        "fees",
        "net",
    ])?;

    for (t, p) in trades.iter().zip(pnl) {
        wtr.write_record([
            t.pair_id.to_string(),
            t.role.to_string(),
            t.side.to_string(),
            t.entry_time.to_string(),
            t.entry_price.to_string(),
            t.stop_price.to_string(),
            t.stop_source.to_string(),
            t.impulse.to_string(),
            t.quantity.to_string(),
            t.tp1_price.map(|v| v.to_string()).unwrap_or_default(),
            t.exit_time.to_string(),
            t.exit_price.to_string(),
            t.reason.to_string(),
            p.partial_pnl.to_string(),
            p.remainder_pnl.to_string(),
            p.fees.to_string(),
            p.net.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export enriched bars as CSV. Indicator cells are empty until the column's
/// warmup completes.
pub fn export_bars_csv(bars: &[Bar]) -> Result<String> {
    fn cell(v: Option<Decimal>) -> String {
        v.map(|d| d.to_string()).unwrap_or_default()
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "open_time",
        "open",
        "high",
        "low",
        "close",
        "ema_short",
        "ema_mid",
        "ema_long",
        "ema_long2",
        "tema",
        "rsi_2h",
        "rsi_2h_avg",
        "impulse",
    ])?;

    for b in bars {
        wtr.write_record([
            b.open_time.to_string(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            cell(b.ema_short),
            cell(b.ema_mid),
            cell(b.ema_long),
            cell(b.ema_long2),
            cell(b.tema),
            cell(b.rsi_2h),
            cell(b.rsi_2h_avg),
            b.impulse.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a run.
///
/// Creates a directory named `run_{fingerprint-prefix}_{timestamp}/` under
/// `output_dir` containing `manifest.json` and `trades.csv`. Returns the
/// path to the created directory.
pub fn save_artifacts(manifest: &RunManifest, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = manifest.fingerprint.chars().take(8).collect();
    let dirname = format!(
        "run_{}_{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(manifest)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&manifest.trades, &manifest.pnl)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    Ok(run_dir)
}

/// Load a manifest from a run directory, rejecting unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<RunManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslab_core::domain::{ExitReason, Side, StopSource};
    use rust_decimal_macros::dec;

    // ─── Test helpers ────────────────────────────────────────────────

    fn t(minutes: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(minutes)
    }

    fn sample_bar(index: usize) -> Bar {
        Bar {
            open_time: t(30 * index as i64),
            open: dec!(100),
            high: dec!(100.5),
            low: dec!(99.5),
            close: dec!(100),
            ema_short: (index > 0).then_some(dec!(99.8)),
            ema_mid: None,
            ema_long: None,
            ema_long2: None,
            tema: Some(dec!(98)),
            rsi_2h: None,
            rsi_2h_avg: None,
            impulse: false,
        }
    }

    fn sample_trade(role: Role) -> TradeRecord {
        TradeRecord {
            pair_id: 1,
            role,
            side: if role == Role::Main {
                Side::Long
            } else {
                Side::Short
            },
            entry_time: t(210),
            entry_price: dec!(104.00),
            stop_price: dec!(101.00),
            stop_source: StopSource::CrossLevel,
            impulse: true,
            quantity: dec!(32.108),
            tp1_price: (role == Role::Main).then_some(dec!(110.00)),
            exit_time: t(270),
            exit_price: dec!(104.00),
            reason: if role == Role::Main {
                ExitReason::PartialTpOnly
            } else {
                ExitReason::PairCloseWithMain
            },
        }
    }

    fn sample_pnl(net: Decimal) -> PnlRow {
        PnlRow {
            partial_pnl: dec!(96.32),
            remainder_pnl: dec!(0.00),
            fees: dec!(3.67),
            net,
        }
    }

    fn sample_manifest() -> RunManifest {
        let bars: Vec<Bar> = (0..12).map(sample_bar).collect();
        let report = SimReport {
            trades: vec![sample_trade(Role::Main), sample_trade(Role::Hedge)],
            pnl: vec![sample_pnl(dec!(92.65)), sample_pnl(dec!(-14.20))],
            warnings: vec![],
        };
        build_manifest(&RunConfig::hedged(), &bars, &report)
    }

    // ─── Summary ─────────────────────────────────────────────────────

    #[test]
    fn summary_counts_roles_and_outcomes() {
        let manifest = sample_manifest();
        let s = &manifest.summary;

        assert_eq!(s.bar_count, 12);
        assert_eq!(s.first_open, Some(t(0)));
        assert_eq!(s.last_open, Some(t(330)));
        assert_eq!(s.trade_count, 2);
        assert_eq!(s.main_count, 1);
        assert_eq!(s.hedge_count, 1);
        assert_eq!(s.wins, 1);
        assert_eq!(s.losses, 1);
        assert_eq!(s.total_net, dec!(78.45));
        assert_eq!(s.total_fees, dec!(7.34));
        assert_eq!(s.best_net, dec!(92.65));
        assert_eq!(s.worst_net, dec!(-14.20));
    }

    #[test]
    fn fingerprint_tracks_config_and_window() {
        let bars: Vec<Bar> = (0..12).map(sample_bar).collect();
        let report = SimReport {
            trades: vec![],
            pnl: vec![],
            warnings: vec![],
        };
        let plain = build_manifest(&RunConfig::default(), &bars, &report);
        let hedged = build_manifest(&RunConfig::hedged(), &bars, &report);
        let again = build_manifest(&RunConfig::default(), &bars, &report);

        assert_eq!(plain.fingerprint, again.fingerprint);
        assert_ne!(plain.fingerprint, hedged.fingerprint);
    }

    // ─── JSON round-trip ─────────────────────────────────────────────

    #[test]
    fn json_roundtrip() {
        let original = sample_manifest();
        let json = export_json(&original).unwrap();
        let restored = import_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let mut manifest = sample_manifest();
        manifest.schema_version = 99;
        let json = export_json(&manifest).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 99"));
    }

    // ─── CSV trades ──────────────────────────────────────────────────

    #[test]
    fn csv_trades_columns_and_content() {
        let manifest = sample_manifest();
        let csv = export_trades_csv(&manifest.trades, &manifest.pnl).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        let cols: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(cols.len(), 17);
        assert!(cols.contains(&"pair_id"));
        assert!(cols.contains(&"stop_source"));
        assert!(cols.contains(&"tp1_price"));
        assert!(cols.contains(&"net"));

        assert!(lines[1].contains("MAIN"));
        assert!(lines[1].contains("LONG"));
        assert!(lines[1].contains("PARTIAL_TP_ONLY"));
        assert!(lines[1].contains("110.00"));
        assert!(lines[2].contains("HEDGE"));
        assert!(lines[2].contains("PAIR_CLOSE_WITH_MAIN"));
    }

    #[test]
    fn csv_empty_trades() {
        let csv = export_trades_csv(&[], &[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    // ─── CSV bars ────────────────────────────────────────────────────

    #[test]
    fn csv_bars_blank_warmup_cells() {
        let bars: Vec<Bar> = (0..2).map(sample_bar).collect();
        let csv = export_bars_csv(&bars).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(',').count(), 13);
        // Row 1 has no short EMA yet; row 2 does.
        assert!(lines[1].contains(",,"));
        assert!(lines[2].contains("99.8"));
    }

    // ─── Save/load artifacts ─────────────────────────────────────────

    #[test]
    fn save_load_artifacts_roundtrip() {
        let manifest = sample_manifest();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&manifest, dir.path()).unwrap();

        assert!(run_dir.join("manifest.json").exists());
        assert!(run_dir.join("trades.csv").exists());
        let name = run_dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("run_"));

        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn load_missing_dir_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifacts(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("manifest.json"));
    }
}
