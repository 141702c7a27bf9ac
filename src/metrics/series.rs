use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::buckets::group_by_day;
use super::{closed_in_window, Aggregation};
use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnLSeriesPoint {
    pub date: String,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
    pub trade_count: usize,
}

/// Daily and cumulative P&L since `window_start`, ascending by date.
///
/// Feeds both the equity-curve area chart and the daily bar chart.
pub fn build_pnl_series(
    trades: &[Trade],
    window_start: NaiveDate,
    tz: FixedOffset,
) -> Aggregation<Vec<PnLSeriesPoint>> {
    let mut skipped = Vec::new();
    let dated = closed_in_window(trades, Some(window_start), None, tz, &mut skipped);

    let mut cumulative_pnl = 0.0;
    let mut result: Vec<PnLSeriesPoint> = Vec::new();

    for (day, (daily_pnl, trade_count)) in group_by_day(&dated) {
        cumulative_pnl += daily_pnl;
        result.push(PnLSeriesPoint {
            date: day.format("%Y-%m-%d").to_string(),
            daily_pnl,
            cumulative_pnl,
            trade_count,
        });
    }

    Aggregation {
        value: result,
        skipped,
    }
}
