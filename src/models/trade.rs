use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{MetricsError, Result};

/// Direction of a position.
///
/// Backend rows name this field `side` or `trade_type` and use `long`/`buy`
/// or `short`/`sell` in any case; all of them collapse into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }
}

impl FromStr for TradeSide {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(TradeSide::Long),
            "short" | "sell" => Ok(TradeSide::Short),
            _ => Err(MetricsError::parse("side", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetType {
    #[default]
    Stock,
    Option,
    Future,
    Crypto,
    Etf,
    Bond,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "Stock",
            AssetType::Option => "Option",
            AssetType::Future => "Future",
            AssetType::Crypto => "Crypto",
            AssetType::Etf => "ETF",
            AssetType::Bond => "Bond",
        }
    }
}

impl FromStr for AssetType {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "option" => Ok(AssetType::Option),
            "future" => Ok(AssetType::Future),
            "crypto" => Ok(AssetType::Crypto),
            "etf" => Ok(AssetType::Etf),
            "bond" => Ok(AssetType::Bond),
            _ => Err(MetricsError::parse("asset_type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

impl FromStr for TradeStatus {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            _ => Err(MetricsError::parse("status", s)),
        }
    }
}

// The three enums travel as plain strings on the wire.
macro_rules! string_serde {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(
                    &self,
                    serializer: S,
                ) -> std::result::Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(
                    deserializer: D,
                ) -> std::result::Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

string_serde!(TradeSide, AssetType, TradeStatus);

fn default_lot_size() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    #[serde(alias = "trade_type")]
    pub side: TradeSide,
    #[serde(default)]
    pub asset_type: AssetType,

    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default = "default_lot_size")]
    pub standard_lot_size: f64,
    pub quantity: f64,
    #[serde(default)]
    pub commission: f64,

    #[serde(default)]
    pub pnl: Option<f64>,
    pub status: TradeStatus,

    pub entry_date: String,
    #[serde(default)]
    pub exit_date: Option<String>,

    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

impl Trade {
    /// Realized P&L of a closed trade. `None` for open trades and for
    /// closed rows the backend has not filled in yet.
    pub fn closed_pnl(&self) -> Option<f64> {
        match self.status {
            TradeStatus::Closed => self.pnl,
            TradeStatus::Open => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_pnl().is_some()
    }

    /// Deserialize a JSON array of trade rows as returned by the backend.
    pub fn from_json_rows(json: &str) -> Result<Vec<Trade>> {
        let trades: Vec<Trade> = serde_json::from_str(json)?;
        log::debug!("Deserialized {} trade rows", trades.len());
        Ok(trades)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTradeInput {
    pub symbol: String,
    #[serde(alias = "trade_type")]
    pub side: TradeSide,
    #[serde(default)]
    pub asset_type: AssetType,

    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub standard_lot_size: Option<f64>,
    pub quantity: f64,
    #[serde(default)]
    pub commission: f64,

    pub entry_date: String,
    #[serde(default)]
    pub exit_date: Option<String>,

    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeFilters {
    pub status: Option<String>,
    pub symbol: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_normalization() {
        assert_eq!("buy".parse::<TradeSide>().unwrap(), TradeSide::Long);
        assert_eq!("Long".parse::<TradeSide>().unwrap(), TradeSide::Long);
        assert_eq!("SELL".parse::<TradeSide>().unwrap(), TradeSide::Short);
        assert_eq!(" short ".parse::<TradeSide>().unwrap(), TradeSide::Short);
        assert!("flat".parse::<TradeSide>().is_err());
    }

    #[test]
    fn test_deserialize_row_with_trade_type() {
        let json = r#"[{
            "id": "a1",
            "symbol": "AAPL",
            "trade_type": "Short",
            "asset_type": "ETF",
            "entry_price": 190.5,
            "exit_price": 185.0,
            "quantity": 10,
            "commission": 1.5,
            "pnl": 53.5,
            "status": "closed",
            "entry_date": "2024-03-04T14:30:00Z",
            "exit_date": "2024-03-05T15:00:00Z",
            "tags": ["breakout"]
        }]"#;

        let trades = Trade::from_json_rows(json).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.side, TradeSide::Short);
        assert_eq!(trade.asset_type, AssetType::Etf);
        assert_eq!(trade.standard_lot_size, 1.0);
        assert_eq!(trade.closed_pnl(), Some(53.5));
        assert_eq!(trade.tags.as_deref(), Some(&["breakout".to_string()][..]));
    }

    #[test]
    fn test_open_trade_has_no_closed_pnl() {
        let json = r#"{
            "id": "a2",
            "symbol": "BTC",
            "side": "buy",
            "asset_type": "Crypto",
            "entry_price": 42000.0,
            "quantity": 0.1,
            "pnl": 12.0,
            "status": "open",
            "entry_date": "2024-03-04"
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert!(!trade.is_closed());
        assert_eq!(trade.closed_pnl(), None);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"[{
            "id": "a3", "symbol": "X", "side": "long", "entry_price": 1.0,
            "quantity": 1.0, "status": "pending", "entry_date": "2024-03-04"
        }]"#;

        let result = Trade::from_json_rows(json);
        assert!(matches!(result, Err(MetricsError::Json(_))));
    }

    #[test]
    fn test_serializes_enums_as_strings() {
        let value = serde_json::to_value(TradeSide::Short).unwrap();
        assert_eq!(value, serde_json::json!("short"));
        let value = serde_json::to_value(AssetType::Etf).unwrap();
        assert_eq!(value, serde_json::json!("ETF"));
    }
}
