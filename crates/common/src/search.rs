//! Free-text filtering of table rows.

use crate::aggregate::{AggregatedToken, AggregatedTrader};
use crate::types::TradeRecord;

/// Rows that can be matched against a search box.
pub trait Searchable {
    /// Fields the query is matched against.
    fn haystacks(&self) -> Vec<&str>;
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn haystacks(&self) -> Vec<&str> {
        (**self).haystacks()
    }
}

impl Searchable for AggregatedTrader {
    fn haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.wallet.as_str()];
        if let Some(name) = self.name.as_deref() {
            fields.push(name);
        }
        fields
    }
}

impl Searchable for AggregatedToken {
    fn haystacks(&self) -> Vec<&str> {
        vec![self.token_name.as_str(), self.token_address.as_str()]
    }
}

impl Searchable for TradeRecord {
    fn haystacks(&self) -> Vec<&str> {
        vec![self.token_name.as_str(), self.token_address.as_str()]
    }
}

/// Case-insensitive substring match on any haystack. A blank query matches.
pub fn matches_query<T: Searchable>(row: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.haystacks()
        .iter()
        .any(|h| h.to_lowercase().contains(&needle))
}

/// Keeps the rows matching `query`, preserving order.
pub fn filter_rows<T: Searchable>(rows: Vec<T>, query: &str) -> Vec<T> {
    if query.trim().is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| matches_query(row, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, aggregate_tokens};
    use crate::test_support::{now, record};

    fn traders() -> Vec<AggregatedTrader> {
        let mut named = record("1", "6sdE9CabcdD4Sca", "bonk", now());
        named.name = Some("Cented".to_string());
        let records = vec![
            named,
            record("2", "Bx7kQ9wallet", "wif", now()),
            record("3", "ZZtop", "bonk", now()),
        ];
        aggregate(&records)
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        assert_eq!(filter_rows(traders(), "").len(), 3);
        assert_eq!(filter_rows(traders(), "   ").len(), 3);
    }

    #[test]
    fn test_trader_matches_name_case_insensitively() {
        let rows = filter_rows(traders(), "cEnT");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].wallet, "6sdE9CabcdD4Sca");
    }

    #[test]
    fn test_trader_matches_wallet_substring() {
        let rows = filter_rows(traders(), "bx7k");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].wallet, "Bx7kQ9wallet");
    }

    #[test]
    fn test_unnamed_trader_without_wallet_match_is_dropped() {
        assert!(filter_rows(traders(), "nobody").is_empty());
    }

    #[test]
    fn test_token_matches_name_or_address() {
        let records = vec![
            record("1", "w1", "bonk", now()),
            record("2", "w1", "wif", now()),
        ];
        let tokens = aggregate_tokens(&records);
        let by_name = filter_rows(tokens.clone(), "BONK");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].token_address, "bonk-mint");

        let by_address = filter_rows(tokens, "wif-mi");
        assert_eq!(by_address.len(), 1);
        assert_eq!(by_address[0].token_name, "WIF");
    }
}
