use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Trade;

const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Symbol,
    Strategy,
    Tag,
    AssetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

fn keys_for(trade: &Trade, group: GroupKey) -> Vec<String> {
    match group {
        GroupKey::Symbol => vec![trade.symbol.clone()],
        GroupKey::Strategy => vec![
            trade
                .strategy_id
                .clone()
                .unwrap_or_else(|| UNASSIGNED.to_string()),
        ],
        GroupKey::Tag => {
            let mut tags = trade.tags.clone().unwrap_or_default();
            tags.sort();
            tags.dedup();
            tags
        }
        GroupKey::AssetType => vec![trade.asset_type.as_str().to_string()],
    }
}

/// Per-group performance of closed trades, best total P&L first.
///
/// For tags, a trade contributes to every tag it carries and untagged
/// trades are left out.
pub fn breakdown_by(trades: &[Trade], group: GroupKey) -> Vec<GroupStats> {
    let mut groups: HashMap<String, (usize, usize, usize, f64)> = HashMap::new();

    for trade in trades {
        let Some(pnl) = trade.closed_pnl() else {
            continue;
        };
        for key in keys_for(trade, group) {
            let entry = groups.entry(key).or_insert((0, 0, 0, 0.0));
            entry.0 += 1;
            if pnl > 0.0 {
                entry.1 += 1;
            } else if pnl < 0.0 {
                entry.2 += 1;
            }
            entry.3 += pnl;
        }
    }

    let mut result: Vec<GroupStats> = groups
        .into_iter()
        .map(|(key, (trade_count, wins, losses, total_pnl))| GroupStats {
            key,
            trade_count,
            wins,
            losses,
            win_rate: wins as f64 / trade_count as f64 * 100.0,
            total_pnl,
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_pnl
            .total_cmp(&a.total_pnl)
            .then_with(|| a.key.cmp(&b.key))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::{closed, open};
    use crate::models::AssetType;

    #[test]
    fn test_by_symbol_sorted_by_pnl() {
        let mut msft = closed("t2", 50.0, "2024-03-04");
        msft.symbol = "MSFT".to_string();
        let trades = vec![
            closed("t1", 10.0, "2024-03-04"),
            msft,
            closed("t3", -30.0, "2024-03-05"),
            open("t4", "2024-03-05"),
        ];

        let groups = breakdown_by(&trades, GroupKey::Symbol);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "MSFT");
        assert_eq!(groups[1].key, "AAPL");
        assert_eq!(groups[1].trade_count, 2);
        assert_eq!(groups[1].win_rate, 50.0);
        assert_eq!(groups[1].total_pnl, -20.0);
    }

    #[test]
    fn test_by_strategy_groups_unassigned() {
        let mut a = closed("t1", 10.0, "2024-03-04");
        a.strategy_id = Some("orb".to_string());
        let trades = vec![a, closed("t2", 5.0, "2024-03-04")];

        let groups = breakdown_by(&trades, GroupKey::Strategy);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["orb", "unassigned"]);
    }

    #[test]
    fn test_by_tag_counts_each_tag_once() {
        let mut a = closed("t1", 10.0, "2024-03-04");
        a.tags = Some(vec!["breakout".into(), "news".into(), "breakout".into()]);
        let mut b = closed("t2", -4.0, "2024-03-04");
        b.tags = Some(vec!["news".into()]);
        let untagged = closed("t3", 100.0, "2024-03-04");

        let groups = breakdown_by(&[a, b, untagged], GroupKey::Tag);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "breakout");
        assert_eq!(groups[0].trade_count, 1);
        assert_eq!(groups[1].key, "news");
        assert_eq!(groups[1].trade_count, 2);
        assert_eq!(groups[1].total_pnl, 6.0);
    }

    #[test]
    fn test_by_asset_type() {
        let mut opt = closed("t1", 10.0, "2024-03-04");
        opt.asset_type = AssetType::Option;
        let groups = breakdown_by(&[opt, closed("t2", 1.0, "2024-03-04")], GroupKey::AssetType);
        assert_eq!(groups[0].key, "Option");
        assert_eq!(groups[1].key, "Stock");
    }
}
