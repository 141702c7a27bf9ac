//! Trade metrics aggregation.
//!
//! Every function here is a pure computation over an in-memory slice of
//! trades. The reference day and the viewer's UTC offset are always passed
//! in by the caller, so the same input produces the same output no matter
//! when or where it runs.
//!
//! Trades whose dates cannot be parsed never abort an aggregation. They are
//! left out of the date-dependent part of the computation and reported in
//! [`Aggregation::skipped`].

pub mod breakdown;
pub mod buckets;
pub mod dates;
pub mod pnl;
pub mod series;
pub mod summary;

pub use breakdown::{breakdown_by, GroupKey, GroupStats};
pub use buckets::{bucket_daily, bucket_weekly, DailyBucket, WeeklyBucket};
pub use dates::{month_window, utc};
pub use pnl::{compute_trade_cost_and_pnl, TradePnl};
pub use series::{build_pnl_series, PnLSeriesPoint};
pub use summary::{compute_summary_stats, MonthlyActivity, SummaryStats, PROFIT_FACTOR_SENTINEL};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::models::Trade;

/// A trade left out of a date-dependent computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTrade {
    pub trade_id: String,
    pub field: String,
    pub value: String,
}

/// Result of an aggregation together with the trades it had to skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation<T> {
    pub value: T,
    pub skipped: Vec<SkippedTrade>,
}

impl<T> Aggregation<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Aggregation<U> {
        Aggregation {
            value: f(self.value),
            skipped: self.skipped,
        }
    }
}

/// A trade paired with its entry time on the viewer's wall clock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DatedTrade<'a> {
    pub trade: &'a Trade,
    pub entry: NaiveDateTime,
}

impl DatedTrade<'_> {
    pub fn entry_day(&self) -> NaiveDate {
        self.entry.date()
    }
}

pub(crate) fn record_skip(skipped: &mut Vec<SkippedTrade>, trade: &Trade, err: MetricsError) {
    let (field, value) = match err {
        MetricsError::Parse { field, value } => (field, value),
        other => ("unknown".to_string(), other.to_string()),
    };
    log::warn!(
        "Skipping trade {} in date-based metrics: unparseable {} '{}'",
        trade.id,
        field,
        value
    );
    skipped.push(SkippedTrade {
        trade_id: trade.id.clone(),
        field,
        value,
    });
}

/// Parse the entry date of every trade in `tz`, collecting those that fail.
pub(crate) fn with_entry_dates<'a, I>(
    trades: I,
    tz: FixedOffset,
    skipped: &mut Vec<SkippedTrade>,
) -> Vec<DatedTrade<'a>>
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut dated = Vec::new();
    for trade in trades {
        match dates::parse_local("entry_date", &trade.entry_date, tz) {
            Ok(entry) => dated.push(DatedTrade { trade, entry }),
            Err(e) => record_skip(skipped, trade, e),
        }
    }
    dated
}

/// Closed trades whose entry day falls inside `[from, to]` (either bound optional).
pub(crate) fn closed_in_window<'a>(
    trades: &'a [Trade],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: FixedOffset,
    skipped: &mut Vec<SkippedTrade>,
) -> Vec<DatedTrade<'a>> {
    with_entry_dates(trades.iter().filter(|t| t.is_closed()), tz, skipped)
        .into_iter()
        .filter(|d| {
            let day = d.entry_day();
            from.is_none_or(|f| day >= f) && to.is_none_or(|t| day <= t)
        })
        .collect()
}
