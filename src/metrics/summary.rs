use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dates::{month_start, parse_local, previous_month_start};
use super::{record_skip, with_entry_dates, Aggregation, DatedTrade, SkippedTrade};
use crate::models::{Trade, TradeSide, TradeStatus};

/// Legacy display value for a profit factor with no losing trades.
pub const PROFIT_FACTOR_SENTINEL: f64 = 999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,

    pub win_rate: f64,
    pub loss_rate: f64,
    pub longs_win_rate: f64,

    pub total_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    /// `None` when there are winning trades but no losses.
    pub profit_factor: Option<f64>,
    pub avg_win_trade: f64,
    pub avg_loss_trade: f64,
    pub trade_expectancy: f64,

    pub trading_days: usize,
    pub winning_days: usize,
    pub day_win_rate: f64,

    pub avg_trade_duration_hours: f64,
    pub avg_trade_duration: String,

    pub monthly_trades: usize,
    pub last_month_trades: usize,
    pub monthly_change: f64,
}

impl SummaryStats {
    pub fn profit_factor_or_sentinel(&self) -> f64 {
        self.profit_factor.unwrap_or(PROFIT_FACTOR_SENTINEL)
    }

    /// Overwrite the month-over-month figures.
    pub fn set_monthly_activity(&mut self, activity: MonthlyActivity) {
        self.monthly_trades = activity.monthly_trades;
        self.last_month_trades = activity.last_month_trades;
        self.monthly_change = activity.monthly_change;
    }
}

fn ratio_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Trades entered this month against the month before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    pub monthly_trades: usize,
    pub last_month_trades: usize,
    /// Percent change, 0 when last month had no trades.
    pub monthly_change: f64,
}

pub(crate) fn monthly_activity(dated: &[DatedTrade<'_>], as_of: NaiveDate) -> MonthlyActivity {
    let current_start = month_start(as_of);
    let last_start = previous_month_start(as_of);

    let monthly_trades = dated.iter().filter(|d| d.entry_day() >= current_start).count();
    let last_month_trades = dated
        .iter()
        .filter(|d| {
            let day = d.entry_day();
            day >= last_start && day < current_start
        })
        .count();
    let monthly_change = if last_month_trades == 0 {
        0.0
    } else {
        (monthly_trades as f64 - last_month_trades as f64) / last_month_trades as f64 * 100.0
    };

    MonthlyActivity {
        monthly_trades,
        last_month_trades,
        monthly_change,
    }
}

/// Render an hour count as `"{H}h {M}m"`.
pub fn format_duration_hours(hours: f64) -> String {
    let mut whole = hours.floor();
    let mut minutes = ((hours - whole) * 60.0).round();
    if minutes >= 60.0 {
        whole += 1.0;
        minutes -= 60.0;
    }
    format!("{}h {}m", whole as i64, minutes as i64)
}

/// Compute the dashboard summary for `trades` as seen on `as_of` from a
/// viewer at UTC offset `tz`.
pub fn compute_summary_stats(
    trades: &[Trade],
    as_of: NaiveDate,
    tz: FixedOffset,
) -> Aggregation<SummaryStats> {
    let mut skipped: Vec<SkippedTrade> = Vec::new();

    let closed: Vec<(&Trade, f64)> = trades
        .iter()
        .filter_map(|t| t.closed_pnl().map(|pnl| (t, pnl)))
        .collect();

    let open_trades = trades.iter().filter(|t| t.status == TradeStatus::Open).count();

    let wins = closed.iter().filter(|(_, pnl)| *pnl > 0.0).count();
    let losses = closed.iter().filter(|(_, pnl)| *pnl < 0.0).count();
    let breakevens = closed.len() - wins - losses;

    let win_rate = ratio_pct(wins, closed.len());
    let loss_rate = ratio_pct(losses, closed.len());

    let longs: Vec<f64> = closed
        .iter()
        .filter(|(t, _)| t.side == TradeSide::Long)
        .map(|(_, pnl)| *pnl)
        .collect();
    let longs_win_rate = ratio_pct(longs.iter().filter(|pnl| **pnl > 0.0).count(), longs.len());

    let total_pnl: f64 = closed.iter().map(|(_, pnl)| pnl).sum();
    let gross_profit: f64 = closed.iter().map(|(_, pnl)| *pnl).filter(|p| *p > 0.0).sum();
    let gross_loss: f64 = closed
        .iter()
        .map(|(_, pnl)| *pnl)
        .filter(|p| *p < 0.0)
        .sum::<f64>()
        .abs();

    let best_trade = closed
        .iter()
        .map(|(_, pnl)| *pnl)
        .reduce(f64::max)
        .unwrap_or(0.0);
    let worst_trade = closed
        .iter()
        .map(|(_, pnl)| *pnl)
        .reduce(f64::min)
        .unwrap_or(0.0);

    let profit_factor = if gross_loss > 0.0 {
        Some(gross_profit / gross_loss)
    } else if wins > 0 {
        None
    } else {
        Some(0.0)
    };

    let avg_win_trade = mean(gross_profit, wins);
    let avg_loss_trade = mean(gross_loss, losses);
    let trade_expectancy = win_rate / 100.0 * avg_win_trade - loss_rate / 100.0 * avg_loss_trade;

    // Entry dates are needed both for day grouping and monthly counts, so
    // every trade is parsed once here.
    let dated = with_entry_dates(trades.iter(), tz, &mut skipped);

    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for d in dated.iter() {
        if let Some(pnl) = d.trade.closed_pnl() {
            *daily.entry(d.entry_day()).or_insert(0.0) += pnl;
        }
    }
    let trading_days = daily.len();
    let winning_days = daily.values().filter(|pnl| **pnl > 0.0).count();
    let day_win_rate = ratio_pct(winning_days, trading_days);

    let mut total_hours = 0.0;
    let mut timed_trades = 0usize;
    for d in dated.iter() {
        let Some(exit_raw) = d.trade.exit_date.as_deref() else {
            continue;
        };
        match parse_local("exit_date", exit_raw, tz) {
            Ok(exit) => {
                total_hours += (exit - d.entry).num_milliseconds() as f64 / 3_600_000.0;
                timed_trades += 1;
            }
            Err(e) => record_skip(&mut skipped, d.trade, e),
        }
    }
    let avg_trade_duration_hours = mean(total_hours, timed_trades);

    let activity = monthly_activity(&dated, as_of);

    log::debug!(
        "Summary over {} trades ({} closed, {} trading days, {} skipped)",
        trades.len(),
        closed.len(),
        trading_days,
        skipped.len()
    );

    Aggregation {
        value: SummaryStats {
            total_trades: trades.len(),
            closed_trades: closed.len(),
            open_trades,
            wins,
            losses,
            breakevens,
            win_rate,
            loss_rate,
            longs_win_rate,
            total_pnl,
            gross_profit,
            gross_loss,
            best_trade,
            worst_trade,
            profit_factor,
            avg_win_trade,
            avg_loss_trade,
            trade_expectancy,
            trading_days,
            winning_days,
            day_win_rate,
            avg_trade_duration_hours,
            avg_trade_duration: format_duration_hours(avg_trade_duration_hours),
            monthly_trades: activity.monthly_trades,
            last_month_trades: activity.last_month_trades,
            monthly_change: activity.monthly_change,
        },
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::{closed, new_york, open};
    use crate::metrics::utc;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn summary(trades: &[Trade]) -> Aggregation<SummaryStats> {
        compute_summary_stats(trades, as_of(), utc())
    }

    #[test]
    fn test_basic_example() {
        let trades = vec![
            closed("t1", 100.0, "2024-03-04T10:00:00Z"),
            closed("t2", -50.0, "2024-03-05T10:00:00Z"),
            open("t3", "2024-03-06T10:00:00Z"),
        ];

        let stats = summary(&trades).value;
        assert_eq!(stats.win_rate, 50.0);
        assert_eq!(stats.total_pnl, 50.0);
        assert_eq!(stats.profit_factor, Some(2.0));
        assert_eq!(stats.best_trade, 100.0);
        assert_eq!(stats.worst_trade, -50.0);
        assert_eq!(stats.open_trades, 1);
        assert_eq!(stats.avg_win_trade, 100.0);
        assert_eq!(stats.avg_loss_trade, 50.0);
        // 0.5 * 100 - 0.5 * 50
        assert_eq!(stats.trade_expectancy, 25.0);
        assert_eq!(stats.day_win_rate, 50.0);
    }

    #[test]
    fn test_all_winners_profit_factor_undefined() {
        let trades = vec![
            closed("t1", 10.0, "2024-03-04"),
            closed("t2", 20.0, "2024-03-05"),
        ];

        let stats = summary(&trades).value;
        assert_eq!(stats.profit_factor, None);
        assert_eq!(stats.profit_factor_or_sentinel(), PROFIT_FACTOR_SENTINEL);
        assert_eq!(stats.win_rate, 100.0);
    }

    #[test]
    fn test_no_closed_trades_is_all_zero() {
        let trades = vec![open("t1", "2024-03-04"), open("t2", "2024-03-05")];

        let stats = summary(&trades).value;
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.longs_win_rate, 0.0);
        assert_eq!(stats.profit_factor, Some(0.0));
        assert_eq!(stats.best_trade, 0.0);
        assert_eq!(stats.avg_win_trade, 0.0);
        assert_eq!(stats.avg_loss_trade, 0.0);
        assert_eq!(stats.trade_expectancy, 0.0);
        assert_eq!(stats.day_win_rate, 0.0);
        assert_eq!(stats.avg_trade_duration, "0h 0m");

        let empty = summary(&[]);
        assert_eq!(empty.value.total_trades, 0);
        assert!(empty.skipped.is_empty());
    }

    #[test]
    fn test_closed_trade_without_pnl_is_ignored() {
        let mut pending = closed("t2", 0.0, "2024-03-04");
        pending.pnl = None;
        let trades = vec![closed("t1", -20.0, "2024-03-04"), pending];

        let stats = summary(&trades).value;
        assert_eq!(stats.closed_trades, 1);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.profit_factor, Some(0.0));
    }

    #[test]
    fn test_longs_win_rate() {
        let mut short_win = closed("t3", 40.0, "2024-03-04");
        short_win.side = TradeSide::Short;
        let trades = vec![
            closed("t1", 10.0, "2024-03-04"),
            closed("t2", -10.0, "2024-03-04"),
            short_win,
        ];

        let stats = summary(&trades).value;
        assert_eq!(stats.longs_win_rate, 50.0);
        assert!((stats.win_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_longs_win_rate_zero_when_all_short() {
        let trades: Vec<Trade> = [("t1", 25.0), ("t2", -5.0), ("t3", 10.0)]
            .into_iter()
            .map(|(id, pnl)| Trade {
                side: TradeSide::Short,
                ..closed(id, pnl, "2024-03-04")
            })
            .collect();

        let stats = summary(&trades).value;
        assert_eq!(stats.closed_trades, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.longs_win_rate, 0.0);
        assert!((stats.win_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_win_rate_uses_daily_sums() {
        let trades = vec![
            closed("t1", 30.0, "2024-03-04T09:00:00"),
            closed("t2", -50.0, "2024-03-04T15:00:00"),
            closed("t3", 5.0, "2024-03-05T09:00:00"),
        ];

        let stats = summary(&trades).value;
        assert_eq!(stats.trading_days, 2);
        assert_eq!(stats.winning_days, 1);
        assert_eq!(stats.day_win_rate, 50.0);
    }

    #[test]
    fn test_average_duration() {
        let mut a = closed("t1", 1.0, "2024-03-04T09:00:00Z");
        a.exit_date = Some("2024-03-04T11:00:00Z".to_string());
        let mut b = closed("t2", 1.0, "2024-03-04T09:00:00Z");
        b.exit_date = Some("2024-03-04T10:30:00Z".to_string());
        let no_exit = closed("t3", 1.0, "2024-03-04T09:00:00Z");

        let stats = summary(&[a, b, no_exit]).value;
        // (2h + 1h30m) / 2
        assert_eq!(stats.avg_trade_duration_hours, 1.75);
        assert_eq!(stats.avg_trade_duration, "1h 45m");
    }

    #[test]
    fn test_duration_keeps_sub_second_precision() {
        let mut a = closed("t1", 1.0, "2024-03-04T09:00:00.000Z");
        a.exit_date = Some("2024-03-04T09:00:01.800Z".to_string());

        let stats = summary(&[a]).value;
        assert!((stats.avg_trade_duration_hours - 1.8 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_days_follow_viewer_offset() {
        // Both rows are the evening of the 4th in New York
        let trades = vec![
            closed("t1", 10.0, "2024-03-04T23:00:00Z"),
            closed("t2", -4.0, "2024-03-05T01:30:00Z"),
        ];

        let in_utc = summary(&trades).value;
        assert_eq!(in_utc.trading_days, 2);

        let local = compute_summary_stats(&trades, as_of(), new_york()).value;
        assert_eq!(local.trading_days, 1);
        assert_eq!(local.winning_days, 1);
    }

    #[test]
    fn test_format_duration_carries_minutes() {
        assert_eq!(format_duration_hours(2.0), "2h 0m");
        assert_eq!(format_duration_hours(1.9999), "2h 0m");
        assert_eq!(format_duration_hours(0.25), "0h 15m");
    }

    #[test]
    fn test_monthly_change() {
        let trades = vec![
            closed("t1", 1.0, "2024-02-10"),
            closed("t2", 1.0, "2024-02-20"),
            closed("t3", 1.0, "2024-03-01"),
            open("t4", "2024-03-15"),
            open("t5", "2024-03-18"),
            closed("t6", 1.0, "2024-01-31"),
        ];

        let stats = summary(&trades).value;
        assert_eq!(stats.monthly_trades, 3);
        assert_eq!(stats.last_month_trades, 2);
        assert_eq!(stats.monthly_change, 50.0);
    }

    #[test]
    fn test_malformed_dates_are_reported_not_fatal() {
        let mut bad_exit = closed("t2", -5.0, "2024-03-04T09:00:00Z");
        bad_exit.exit_date = Some("later".to_string());
        let trades = vec![closed("t1", 10.0, "not a date"), bad_exit];

        let result = summary(&trades);
        let stats = result.value;
        // Scalar stats still see both trades
        assert_eq!(stats.closed_trades, 2);
        assert_eq!(stats.total_pnl, 5.0);
        // Day grouping only sees the parseable one
        assert_eq!(stats.trading_days, 1);
        assert_eq!(stats.avg_trade_duration_hours, 0.0);

        let ids: Vec<(&str, &str)> = result
            .skipped
            .iter()
            .map(|s| (s.trade_id.as_str(), s.field.as_str()))
            .collect();
        assert_eq!(ids, vec![("t1", "entry_date"), ("t2", "exit_date")]);
    }

    #[test]
    fn test_idempotent() {
        let trades = vec![
            closed("t1", 12.34, "2024-03-04T09:00:00Z"),
            closed("t2", -7.5, "2024-02-14T09:00:00Z"),
            open("t3", "2024-03-06"),
        ];

        let first = summary(&trades);
        let second = summary(&trades);
        assert_eq!(first, second);
    }
}
