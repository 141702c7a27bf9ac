use serde::{Deserialize, Serialize};

use crate::models::{AssetType, CommissionPolicy, TradeSide};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePnl {
    pub entry_cost: f64,
    pub exit_cost: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    /// Gross P&L less commission.
    pub net_pnl: f64,
}

impl TradePnl {
    /// The value to store as the trade's `pnl`.
    pub fn persisted_pnl(&self, policy: CommissionPolicy) -> f64 {
        match policy {
            CommissionPolicy::Subtract => self.net_pnl,
            CommissionPolicy::Ignore => self.gross_pnl,
        }
    }
}

/// Position cost at `price`. Options are quoted per share, so the contract
/// lot size scales them.
fn total_cost(price: f64, quantity: f64, lot_size: f64, asset_type: AssetType) -> f64 {
    let multiplier = if asset_type == AssetType::Option { lot_size } else { 1.0 };
    price * quantity * multiplier
}

pub fn compute_trade_cost_and_pnl(
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    lot_size: f64,
    asset_type: AssetType,
    side: TradeSide,
    commission: f64,
) -> TradePnl {
    let entry_cost = total_cost(entry_price, quantity, lot_size, asset_type);
    let exit_cost = total_cost(exit_price, quantity, lot_size, asset_type);

    let gross_pnl = match side {
        TradeSide::Long => exit_cost - entry_cost,
        TradeSide::Short => entry_cost - exit_cost,
    };

    TradePnl {
        entry_cost,
        exit_cost,
        gross_pnl,
        commission,
        net_pnl: gross_pnl - commission,
    }
}
