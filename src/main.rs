use anyhow::Context;
use chrono::{NaiveDate, Offset};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use trade_journal_metrics::commands::{self, DashboardStats, DateRange};
use trade_journal_metrics::metrics::{Aggregation, PnLSeriesPoint};
use trade_journal_metrics::models::{Settings, Trade};

#[derive(Parser, Debug)]
#[command(name = "journal-stats")]
#[command(about = "Dashboard statistics and equity curve for a trade journal export")]
struct Args {
    /// JSON array of trade rows
    trades_path: PathBuf,

    /// Look-back window; the equity curve falls back to the configured window when omitted
    #[arg(long, value_parser = DateRange::NAMES)]
    range: Option<String>,

    /// Reference day (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    dashboard: DashboardStats,
    equity_curve: Aggregation<Vec<PnLSeriesPoint>>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {:?}", path))?,
        None => Settings::default(),
    };

    let json = std::fs::read_to_string(&args.trades_path)
        .with_context(|| format!("failed to read {:?}", args.trades_path))?;
    let trades = Trade::from_json_rows(&json).context("failed to parse trade rows")?;

    let now = chrono::Local::now();
    let tz = settings.utc_offset().unwrap_or_else(|| now.offset().fix());
    let as_of = args.as_of.unwrap_or_else(|| now.with_timezone(&tz).date_naive());
    log::info!("Computing stats for {} trades as of {} (UTC{})", trades.len(), as_of, tz);

    let range = args.range.as_deref();
    let dashboard = commands::get_dashboard_stats(&trades, range, as_of, tz)?;
    let equity_curve = commands::get_equity_curve(&trades, range, as_of, &settings, tz)?;

    if !dashboard.skipped.is_empty() {
        log::warn!("{} trades had unparseable dates", dashboard.skipped.len());
    }

    let report = Report {
        dashboard,
        equity_curve,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
