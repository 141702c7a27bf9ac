use chrono::{FixedOffset, NaiveDateTime, Utc};

use crate::error::{MetricsError, Result};
use crate::metrics::compute_trade_cost_and_pnl;
use crate::metrics::dates::{parse_local, parse_timestamp};
use crate::models::{CreateTradeInput, Settings, Trade, TradeFilters, TradeStatus};

fn new_trade_id() -> String {
    format!("TRADE-{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
}

/// In-memory equivalent of the backend's filtered trade listing.
///
/// Newest entries first; rows with an unparseable entry date sort last and
/// never match a date filter. Date filters apply to the entry day in `tz`.
pub fn filter_trades(
    trades: &[Trade],
    filters: &TradeFilters,
    tz: FixedOffset,
) -> Result<Vec<Trade>> {
    let status = match filters.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(raw.parse::<TradeStatus>()?),
    };
    let symbol = filters.symbol.as_ref().map(|s| s.to_lowercase());

    let mut matched: Vec<(Option<NaiveDateTime>, &Trade)> = trades
        .iter()
        .map(|t| (parse_local("entry_date", &t.entry_date, tz).ok(), t))
        .filter(|(_, t)| status.is_none_or(|s| t.status == s))
        .filter(|(_, t)| {
            symbol
                .as_ref()
                .is_none_or(|s| t.symbol.to_lowercase().contains(s.as_str()))
        })
        .filter(|(entry, _)| {
            if filters.start_date.is_none() && filters.end_date.is_none() {
                return true;
            }
            let Some(day) = entry.map(|e| e.date()) else {
                return false;
            };
            filters.start_date.is_none_or(|start| day >= start)
                && filters.end_date.is_none_or(|end| day <= end)
        })
        .collect();

    matched.sort_by(|a, b| b.0.cmp(&a.0));

    let rows = matched.into_iter().map(|(_, t)| t.clone());
    let result = match (filters.page, filters.limit) {
        (Some(page), Some(limit)) => {
            if page == 0 {
                return Err(MetricsError::InvalidFilter("page numbers start at 1".to_string()));
            }
            let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
                MetricsError::InvalidFilter(format!("page {} is out of range", page))
            })?;
            rows.skip(offset).take(limit).collect()
        }
        _ => rows.collect(),
    };

    Ok(result)
}

/// Build a new trade record ready to be stored by the backend.
///
/// A trade created with an exit price is already closed and carries its
/// realized P&L, computed under the configured commission policy.
pub fn create_trade(input: CreateTradeInput, settings: &Settings) -> Result<Trade> {
    parse_timestamp("entry_date", &input.entry_date)?;
    if let Some(exit_date) = input.exit_date.as_deref() {
        parse_timestamp("exit_date", exit_date)?;
    }

    let lot_size = input.standard_lot_size.unwrap_or(1.0);
    let (status, pnl) = match input.exit_price {
        Some(exit_price) => {
            let computed = compute_trade_cost_and_pnl(
                input.entry_price,
                exit_price,
                input.quantity,
                lot_size,
                input.asset_type,
                input.side,
                input.commission,
            );
            (TradeStatus::Closed, Some(computed.persisted_pnl(settings.commission_policy)))
        }
        None => (TradeStatus::Open, None),
    };

    let trade = Trade {
        id: new_trade_id(),
        symbol: input.symbol,
        side: input.side,
        asset_type: input.asset_type,
        entry_price: input.entry_price,
        exit_price: input.exit_price,
        stop_loss: input.stop_loss,
        standard_lot_size: lot_size,
        quantity: input.quantity,
        commission: input.commission,
        pnl,
        status,
        entry_date: input.entry_date,
        exit_date: input.exit_date,
        strategy_id: input.strategy_id,
        tags: input.tags,
        notes: input.notes,
        screenshot_url: input.screenshot_url,
    };

    log::info!("Created trade {} ({} {})", trade.id, trade.symbol, trade.status);
    Ok(trade)
}

/// Close `trade` at `exit_price`, recomputing its persisted P&L.
pub fn close_trade(
    trade: &Trade,
    exit_price: f64,
    exit_date: &str,
    settings: &Settings,
) -> Result<Trade> {
    let entry = parse_timestamp("entry_date", &trade.entry_date)?;
    let exit = parse_timestamp("exit_date", exit_date)?;
    if exit < entry {
        log::warn!("Trade {} closes before it was entered", trade.id);
    }

    let computed = compute_trade_cost_and_pnl(
        trade.entry_price,
        exit_price,
        trade.quantity,
        trade.standard_lot_size,
        trade.asset_type,
        trade.side,
        trade.commission,
    );

    Ok(Trade {
        exit_price: Some(exit_price),
        exit_date: Some(exit_date.to_string()),
        pnl: Some(computed.persisted_pnl(settings.commission_policy)),
        status: TradeStatus::Closed,
        ..trade.clone()
    })
}
