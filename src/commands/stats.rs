use chrono::{Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{MetricsError, Result};
use crate::metrics::dates::months_before;
use crate::metrics::summary::monthly_activity;
use crate::metrics::{
    breakdown_by, bucket_daily, bucket_weekly, build_pnl_series, compute_summary_stats,
    month_window, with_entry_dates, Aggregation, DailyBucket, GroupKey, GroupStats,
    PnLSeriesPoint, SkippedTrade, SummaryStats, WeeklyBucket,
};
use crate::models::{Settings, Trade};

/// Named look-back windows offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Week,
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    Year,
    All,
}

impl FromStr for DateRange {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "3months" => Ok(DateRange::ThreeMonths),
            "6months" => Ok(DateRange::SixMonths),
            "year" => Ok(DateRange::Year),
            "all" => Ok(DateRange::All),
            other => Err(MetricsError::InvalidDateRange(other.to_string())),
        }
    }
}

impl DateRange {
    pub const NAMES: [&'static str; 7] =
        ["today", "week", "month", "3months", "6months", "year", "all"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::ThreeMonths => "3months",
            DateRange::SixMonths => "6months",
            DateRange::Year => "year",
            DateRange::All => "all",
        }
    }

    /// First day included in the range, `None` for the whole history.
    pub fn window_start(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        let days_back = match self {
            DateRange::Today => 0,
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::ThreeMonths => 90,
            DateRange::SixMonths => 180,
            DateRange::Year => 365,
            DateRange::All => return None,
        };
        Some(as_of.checked_sub_days(Days::new(days_back)).unwrap_or(NaiveDate::MIN))
    }
}

fn parse_range(date_range: Option<&str>) -> Result<DateRange> {
    date_range.map(DateRange::from_str).unwrap_or(Ok(DateRange::All))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub date_range: DateRange,
    pub stats: SummaryStats,
    pub top_symbols: Vec<GroupStats>,
    pub skipped: Vec<SkippedTrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub daily: BTreeMap<String, DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
    pub skipped: Vec<SkippedTrade>,
}

/// Summary statistics over trades entered within `date_range` (default: all).
///
/// Month-over-month activity always covers the whole journal; the range
/// only narrows the performance figures.
pub fn get_dashboard_stats(
    trades: &[Trade],
    date_range: Option<&str>,
    as_of: NaiveDate,
    tz: FixedOffset,
) -> Result<DashboardStats> {
    let range = parse_range(date_range)?;

    let mut skipped = Vec::new();
    let mut unplaced = Vec::new();
    let dated = with_entry_dates(trades.iter(), tz, &mut unplaced);

    let in_range: Vec<Trade> = match range.window_start(as_of) {
        Some(start) => {
            // The summary pass never sees these rows, so report them here
            skipped.append(&mut unplaced);
            dated
                .iter()
                .filter(|d| d.entry_day() >= start && d.entry_day() <= as_of)
                .map(|d| d.trade.clone())
                .collect()
        }
        None => trades.to_vec(),
    };

    let summary = compute_summary_stats(&in_range, as_of, tz);
    let mut stats = summary.value;
    stats.set_monthly_activity(monthly_activity(&dated, as_of));
    skipped.extend(summary.skipped);

    log::info!(
        "Dashboard stats for {:?}: {} of {} trades in range",
        range,
        in_range.len(),
        trades.len()
    );

    Ok(DashboardStats {
        date_range: range,
        stats,
        top_symbols: breakdown_by(&in_range, GroupKey::Symbol),
        skipped,
    })
}

/// Equity curve since the start of `date_range`, or the configured
/// `pnl_window_months` when no range is given.
pub fn get_equity_curve(
    trades: &[Trade],
    date_range: Option<&str>,
    as_of: NaiveDate,
    settings: &Settings,
    tz: FixedOffset,
) -> Result<Aggregation<Vec<PnLSeriesPoint>>> {
    let window_start = match date_range {
        Some(raw) => DateRange::from_str(raw)?
            .window_start(as_of)
            .unwrap_or(NaiveDate::MIN),
        None => months_before(as_of, settings.pnl_window_months),
    };

    Ok(build_pnl_series(trades, window_start, tz))
}

/// Daily and weekly buckets for a calendar heatmap of `year`-`month`.
pub fn get_calendar_month(
    trades: &[Trade],
    year: i32,
    month: u32,
    tz: FixedOffset,
) -> Result<CalendarMonth> {
    let (start, end) = month_window(year, month)?;

    let daily = bucket_daily(trades, start, end, tz);
    let weekly = bucket_weekly(trades, start, end, tz);

    // Both passes parse the same rows; report each skipped trade once.
    let mut skipped = daily.skipped;
    for s in weekly.skipped {
        if !skipped.contains(&s) {
            skipped.push(s);
        }
    }

    Ok(CalendarMonth {
        year,
        month,
        daily: daily.value,
        weekly: weekly.value,
        skipped,
    })
}
