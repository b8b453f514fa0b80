//! CrossLab CLI — enrich, run, and inspect commands.
//!
//! Commands:
//! - `run` — simulate a candle CSV and save run artifacts
//! - `enrich` — compute indicator columns for a candle CSV
//! - `inspect` — reprint the summary of a saved run directory

mod artifacts;
mod config;
mod data;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crosslab_core::engine::run_backtest;
use crosslab_core::indicators::enrich_candles;
use crosslab_core::signal::collect_triggers;

use crate::artifacts::{build_manifest, load_artifacts, save_artifacts, RunManifest};
use crate::config::RunConfig;

#[derive(Parser)]
#[command(
    name = "crosslab",
    about = "CrossLab CLI — EMA cross/touch strategy simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a candle CSV and save run artifacts.
    Run {
        /// Candle CSV (open_time, open, high, low, close, volume).
        #[arg(long)]
        candles: PathBuf,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Built-in profile: plain, hedged.
        #[arg(long)]
        profile: Option<String>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,

        /// Print the summary without writing artifacts.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Compute indicator columns for a candle CSV.
    Enrich {
        /// Candle CSV (open_time, open, high, low, close, volume).
        #[arg(long)]
        candles: PathBuf,

        /// Output CSV path for the enriched bars.
        #[arg(long)]
        out: PathBuf,

        /// Path to a TOML run config (indicator periods).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reprint the summary of a saved run directory.
    Inspect {
        /// Run directory containing manifest.json.
        run_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            candles,
            config,
            profile,
            output_dir,
            dry_run,
        } => run_cmd(candles, config, profile, output_dir, dry_run),
        Commands::Enrich {
            candles,
            out,
            config,
        } => enrich_cmd(candles, out, config),
        Commands::Inspect { run_dir } => inspect_cmd(&run_dir),
    }
}

fn load_run_config(config: Option<PathBuf>, profile: Option<String>) -> Result<RunConfig> {
    if config.is_some() && profile.is_some() {
        bail!("--config and --profile are mutually exclusive");
    }
    if let Some(path) = config {
        return Ok(RunConfig::from_file(&path)?);
    }
    match profile.as_deref() {
        None | Some("plain") => Ok(RunConfig::default()),
        Some("hedged") => Ok(RunConfig::hedged()),
        Some(other) => bail!("unknown profile '{other}'. Valid: plain, hedged"),
    }
}

fn run_cmd(
    candles_path: PathBuf,
    config: Option<PathBuf>,
    profile: Option<String>,
    output_dir: PathBuf,
    dry_run: bool,
) -> Result<()> {
    let run_config = load_run_config(config, profile)?;

    let candles = data::load_candles(&candles_path)?;
    info!(
        candles = candles.len(),
        path = %candles_path.display(),
        "candles loaded"
    );

    let bars = enrich_candles(&candles, &run_config.indicators);
    let report = run_backtest(&bars, &run_config.simulation)?;
    for warning in &report.warnings {
        warn!("{warning}");
    }
    info!(trades = report.trades.len(), "simulation finished");

    let manifest = build_manifest(&run_config, &bars, &report);
    print_summary(&manifest);

    if dry_run {
        return Ok(());
    }
    let run_dir = save_artifacts(&manifest, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn enrich_cmd(candles_path: PathBuf, out: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let run_config = match config {
        Some(path) => RunConfig::from_file(&path)?,
        None => RunConfig::default(),
    };

    let candles = data::load_candles(&candles_path)?;
    let bars = enrich_candles(&candles, &run_config.indicators);
    let triggers = collect_triggers(
        &bars,
        run_config.simulation.cross_window_bars,
        run_config.simulation.touch_window_bars,
    );
    std::fs::write(&out, artifacts::export_bars_csv(&bars)?)?;
    info!(
        bars = bars.len(),
        triggers = triggers.len(),
        out = %out.display(),
        "enriched bars written"
    );

    Ok(())
}

fn inspect_cmd(run_dir: &Path) -> Result<()> {
    let manifest = load_artifacts(run_dir)?;
    print_summary(&manifest);
    Ok(())
}

fn print_summary(manifest: &RunManifest) {
    let s = &manifest.summary;
    let fingerprint: String = manifest.fingerprint.chars().take(16).collect();

    println!();
    println!("=== Simulation Result ===");
    println!("Fingerprint:    {fingerprint}");
    match (s.first_open, s.last_open) {
        (Some(first), Some(last)) => println!("Period:         {first} to {last}"),
        _ => println!("Period:         (no bars)"),
    }
    println!("Bars:           {}", s.bar_count);
    println!(
        "Profile:        {}",
        if manifest.config.simulation.hedge {
            "hedged"
        } else {
            "plain"
        }
    );
    println!(
        "Trades:         {} ({} main, {} hedge)",
        s.trade_count, s.main_count, s.hedge_count
    );
    println!();
    println!("--- P&L ---");
    println!("Net:            {}", s.total_net);
    println!("Fees:           {}", s.total_fees);
    println!("Wins/Losses:    {}/{}", s.wins, s.losses);
    if s.trade_count > 0 {
        let win_rate = 100.0 * s.wins as f64 / s.trade_count as f64;
        println!("Win Rate:       {win_rate:.1}%");
        println!("Best Trade:     {}", s.best_net);
        println!("Worst Trade:    {}", s.worst_net);
    }

    if !manifest.trades.is_empty() {
        println!();
        println!("--- Last Trades ---");
        let tail = manifest.trades.len().saturating_sub(5);
        for (trade, pnl) in manifest.trades[tail..].iter().zip(manifest.pnl.iter().skip(tail)) {
            println!(
                "#{} {} {} {} @ {} -> {} @ {} [{}] net {}",
                trade.pair_id,
                trade.role,
                trade.side,
                trade.entry_time,
                trade.entry_price,
                trade.exit_time,
                trade.exit_price,
                trade.reason,
                pnl.net
            );
        }
    }

    for warning in &manifest.warnings {
        println!("WARNING: {warning}");
    }
    println!();
}
