use chrono::{Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::dates::{week_end, week_start};
use super::{closed_in_window, Aggregation, DatedTrade};
use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: String,
    pub pnl: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    pub week_number: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pnl: f64,
    pub trading_days: usize,
}

/// Sum P&L and count trades per local entry day.
pub(crate) fn group_by_day(dated: &[DatedTrade<'_>]) -> BTreeMap<NaiveDate, (f64, usize)> {
    let mut daily: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for d in dated {
        let Some(pnl) = d.trade.closed_pnl() else {
            continue;
        };
        let entry = daily.entry(d.entry_day()).or_insert((0.0, 0));
        entry.0 += pnl;
        entry.1 += 1;
    }
    daily
}

/// Daily P&L for closed trades entered within `[month_start, month_end]`,
/// keyed by `YYYY-MM-DD` in the `tz` calendar.
pub fn bucket_daily(
    trades: &[Trade],
    month_start: NaiveDate,
    month_end: NaiveDate,
    tz: FixedOffset,
) -> Aggregation<BTreeMap<String, DailyBucket>> {
    let mut skipped = Vec::new();
    let dated = closed_in_window(trades, Some(month_start), Some(month_end), tz, &mut skipped);

    let buckets = group_by_day(&dated)
        .into_iter()
        .map(|(day, (pnl, trade_count))| {
            let date = day.format("%Y-%m-%d").to_string();
            (
                date.clone(),
                DailyBucket {
                    date,
                    pnl,
                    trade_count,
                },
            )
        })
        .collect();

    Aggregation {
        value: buckets,
        skipped,
    }
}

/// Sunday-to-Saturday weekly P&L covering the month window.
///
/// The first week starts on the Sunday on or before `month_start` and the
/// last one ends on the Saturday on or after `month_end`, so edge weeks are
/// always complete.
pub fn bucket_weekly(
    trades: &[Trade],
    month_start: NaiveDate,
    month_end: NaiveDate,
    tz: FixedOffset,
) -> Aggregation<Vec<WeeklyBucket>> {
    let first_sunday = week_start(month_start);
    let last_saturday = week_end(month_end);

    let mut skipped = Vec::new();
    let dated = closed_in_window(trades, Some(first_sunday), Some(last_saturday), tz, &mut skipped);
    let daily = group_by_day(&dated);

    let mut weeks = Vec::new();
    let mut start = first_sunday;
    while start <= last_saturday {
        let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);

        let mut pnl = 0.0;
        let mut days = BTreeSet::new();
        for (day, (day_pnl, _)) in daily.range(start..=end) {
            pnl += day_pnl;
            days.insert(*day);
        }

        weeks.push(WeeklyBucket {
            week_number: weeks.len() + 1,
            start_date: start,
            end_date: end,
            pnl,
            trading_days: days.len(),
        });

        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }

    Aggregation {
        value: weeks,
        skipped,
    }
}
