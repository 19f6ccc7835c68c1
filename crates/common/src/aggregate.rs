//! Per-wallet and per-token reduction of trade records.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{TimeWindow, TradeRecord};
use crate::window::{filter_window, parse_timestamp};

/// One leaderboard row: every in-window record of a wallet folded together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTrader {
    pub wallet: String,
    pub buys: u64,
    pub sells: u64,
    pub invested_sol: f64,
    pub invested_sol_usd: f64,
    pub realized_pnl: f64,
    pub realized_pnl_usd: f64,
    /// Unweighted mean of the member records' ROI.
    pub roi: f64,
    pub first_trade: Option<DateTime<Utc>>,
    pub last_trade: Option<DateTime<Utc>>,
    /// Distinct tokens across the wallet's whole history, not just the window.
    pub unique_tokens: usize,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub followers: f64,
    pub avg_entry_usd: f64,
}

impl AggregatedTrader {
    pub fn trades_total(&self) -> u64 {
        self.buys + self.sells
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.buys, self.sells)
    }

    pub fn hold_minutes(&self) -> f64 {
        span_minutes(self.first_trade, self.last_trade)
    }
}

/// One row of a wallet's token table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedToken {
    pub token_address: String,
    pub token_name: String,
    pub buys: u64,
    pub sells: u64,
    pub invested_sol: f64,
    pub invested_sol_usd: f64,
    pub realized_pnl: f64,
    pub realized_pnl_usd: f64,
    pub roi: f64,
    pub first_trade: Option<DateTime<Utc>>,
    pub last_trade: Option<DateTime<Utc>>,
    pub avg_entry_usd: f64,
}

impl AggregatedToken {
    pub fn trades_total(&self) -> u64 {
        self.buys + self.sells
    }

    pub fn hold_minutes(&self) -> f64 {
        span_minutes(self.first_trade, self.last_trade)
    }
}

/// Share of sells among all trades, in percent. A sell counts as a closed,
/// winning position; zero trades yield 0.
pub fn win_rate(buys: u64, sells: u64) -> f64 {
    let total = buys + sells;
    if total == 0 {
        0.0
    } else {
        sells as f64 / total as f64 * 100.0
    }
}

/// Minutes between a single record's first and last trade; 0 when either
/// timestamp is unusable.
pub fn record_hold_minutes(record: &TradeRecord) -> f64 {
    span_minutes(
        parse_timestamp(&record.first_trade),
        parse_timestamp(&record.last_trade),
    )
}

fn span_minutes(first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) -> f64 {
    match (first, last) {
        (Some(first), Some(last)) if last > first => (last - first).num_seconds() as f64 / 60.0,
        _ => 0.0,
    }
}

#[derive(Debug, Default)]
struct Totals<'a> {
    head: Option<&'a TradeRecord>,
    count: usize,
    buys: u64,
    sells: u64,
    invested_sol: f64,
    invested_sol_usd: f64,
    realized_pnl: f64,
    realized_pnl_usd: f64,
    roi_sum: f64,
    first_trade: Option<DateTime<Utc>>,
    last_trade: Option<DateTime<Utc>>,
}

impl<'a> Totals<'a> {
    fn add(&mut self, r: &'a TradeRecord) {
        self.head.get_or_insert(r);
        self.count += 1;
        self.buys += u64::from(r.buys);
        self.sells += u64::from(r.sells);
        self.invested_sol += r.invested_sol;
        self.invested_sol_usd += r.invested_sol_usd;
        self.realized_pnl += r.realized_pnl;
        self.realized_pnl_usd += r.realized_pnl_usd;
        self.roi_sum += r.roi;
        if let Some(first) = parse_timestamp(&r.first_trade) {
            self.first_trade = Some(self.first_trade.map_or(first, |cur| cur.min(first)));
        }
        if let Some(last) = parse_timestamp(&r.last_trade) {
            self.last_trade = Some(self.last_trade.map_or(last, |cur| cur.max(last)));
        }
    }

    fn roi_mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.roi_sum / self.count as f64
        }
    }
}

/// Groups by `key`, keeping first-occurrence order of the keys.
fn group_by<'a, I, F>(records: I, key: F) -> Vec<(String, Totals<'a>)>
where
    I: IntoIterator<Item = &'a TradeRecord>,
    F: Fn(&TradeRecord) -> &str,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Totals<'a>)> = Vec::new();
    for r in records {
        let k = key(r);
        let slot = match index.get(k) {
            Some(&i) => i,
            None => {
                index.insert(k.to_string(), groups.len());
                groups.push((k.to_string(), Totals::default()));
                groups.len() - 1
            }
        };
        groups[slot].1.add(r);
    }
    groups
}

/// Distinct token addresses per wallet.
pub fn unique_token_counts<'a, I>(records: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut tokens: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in records {
        tokens
            .entry(r.wallet.as_str())
            .or_default()
            .insert(r.token_address.as_str());
    }
    tokens
        .into_iter()
        .map(|(wallet, set)| (wallet.to_string(), set.len()))
        .collect()
}

/// Folds `records` into one row per wallet. Token counts come from the same
/// records; use [`aggregate_window`] to count tokens over the full history.
pub fn aggregate<'a, I>(records: I) -> Vec<AggregatedTrader>
where
    I: IntoIterator<Item = &'a TradeRecord> + Clone,
{
    let token_counts = unique_token_counts(records.clone());
    aggregate_with_token_counts(records, &token_counts)
}

pub fn aggregate_with_token_counts<'a, I>(
    records: I,
    token_counts: &HashMap<String, usize>,
) -> Vec<AggregatedTrader>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    group_by(records, |r| r.wallet.as_str())
        .into_iter()
        .filter_map(|(wallet, totals)| {
            let head = totals.head?;
            Some(AggregatedTrader {
                unique_tokens: token_counts.get(&wallet).copied().unwrap_or(0),
                buys: totals.buys,
                sells: totals.sells,
                invested_sol: totals.invested_sol,
                invested_sol_usd: totals.invested_sol_usd,
                realized_pnl: totals.realized_pnl,
                realized_pnl_usd: totals.realized_pnl_usd,
                roi: totals.roi_mean(),
                first_trade: totals.first_trade,
                last_trade: totals.last_trade,
                name: head.name.clone(),
                avatar: head.avatar.clone(),
                followers: head.followers,
                avg_entry_usd: head.avg_entry_usd,
                wallet,
            })
        })
        .collect()
}

/// Leaderboard rows for `window`: only in-window records are summed, while
/// `unique_tokens` reflects every record of the wallet in `all`.
pub fn aggregate_window(
    all: &[TradeRecord],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<AggregatedTrader> {
    let token_counts = unique_token_counts(all);
    let in_window = filter_window(all, window, now);
    aggregate_with_token_counts(in_window, &token_counts)
}

pub fn wallet_records<'a>(all: &'a [TradeRecord], wallet: &str) -> Vec<&'a TradeRecord> {
    all.iter().filter(|r| r.wallet == wallet).collect()
}

/// Distinct token addresses across `records`.
pub fn token_count<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    records
        .into_iter()
        .map(|r| r.token_address.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Stats over the in-window part of one wallet's records (see
/// [`wallet_records`]); `None` when none of them is in the window.
/// `unique_tokens` counts the wallet's full history.
pub fn wallet_summary(
    own: &[&TradeRecord],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Option<AggregatedTrader> {
    let in_window = own
        .iter()
        .copied()
        .filter(|r| crate::window::is_in_window(r, window, now));
    let mut summary = aggregate_with_token_counts(in_window, &HashMap::new())
        .into_iter()
        .next()?;
    summary.unique_tokens = token_count(own.iter().copied());
    Some(summary)
}

/// Folds `records` into one row per token address.
pub fn aggregate_tokens<'a, I>(records: I) -> Vec<AggregatedToken>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    group_by(records, |r| r.token_address.as_str())
        .into_iter()
        .filter_map(|(token_address, totals)| {
            let head = totals.head?;
            Some(AggregatedToken {
                token_name: head.token_name.clone(),
                buys: totals.buys,
                sells: totals.sells,
                invested_sol: totals.invested_sol,
                invested_sol_usd: totals.invested_sol_usd,
                realized_pnl: totals.realized_pnl,
                realized_pnl_usd: totals.realized_pnl_usd,
                roi: totals.roi_mean(),
                first_trade: totals.first_trade,
                last_trade: totals.last_trade,
                avg_entry_usd: head.avg_entry_usd,
                token_address,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{now, record};
    use chrono::Duration;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_one_row_per_wallet_in_first_occurrence_order() {
        let records = vec![
            record("1", "w2", "t1", now()),
            record("2", "w1", "t1", now()),
            record("3", "w2", "t2", now()),
            record("4", "w3", "t1", now()),
        ];
        let rows = aggregate(&records);
        let wallets: Vec<&str> = rows.iter().map(|r| r.wallet.as_str()).collect();
        assert_eq!(wallets, vec!["w2", "w1", "w3"]);
    }

    #[test]
    fn test_buys_and_sells_sum_and_win_rate_counts_sells() {
        let mut a = record("1", "w1", "t1", now());
        a.buys = 2;
        a.sells = 1;
        let mut b = record("2", "w1", "t2", now());
        b.buys = 0;
        b.sells = 3;
        let rows = aggregate(&[a, b]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].buys, 2);
        assert_eq!(rows[0].sells, 4);
        assert_eq!(rows[0].trades_total(), 6);
        assert!((rows[0].win_rate() - 66.67).abs() < 0.01);
    }

    #[test]
    fn test_win_rate_zero_trades_is_zero() {
        assert_close(win_rate(0, 0), 0.0);
        assert_close(win_rate(5, 0), 0.0);
        assert_close(win_rate(0, 5), 100.0);
    }

    #[test]
    fn test_roi_is_unweighted_mean_of_records() {
        let mut a = record("1", "w1", "t1", now());
        a.roi = 100.0;
        a.invested_sol = 1.0;
        let mut b = record("2", "w1", "t2", now());
        b.roi = -20.0;
        b.invested_sol = 99.0;
        let rows = aggregate(&[a, b]);
        // Mean of 100 and -20, not pnl / invested.
        assert_close(rows[0].roi, 40.0);
    }

    #[test]
    fn test_extremal_timestamps_and_hold_minutes() {
        let mut a = record("1", "w1", "t1", now() - Duration::hours(3));
        a.first_trade = (now() - Duration::hours(5)).to_rfc3339();
        let b = record("2", "w1", "t2", now() - Duration::minutes(30));
        let rows = aggregate(&[a, b]);
        assert_eq!(rows[0].first_trade, Some(now() - Duration::hours(5)));
        assert_eq!(rows[0].last_trade, Some(now() - Duration::minutes(30)));
        assert_close(rows[0].hold_minutes(), 270.0);
    }

    #[test]
    fn test_display_fields_come_from_first_record() {
        let mut a = record("1", "w1", "t1", now());
        a.name = Some("Orangie".to_string());
        a.followers = 279.0;
        a.avg_entry_usd = 212_000.0;
        let mut b = record("2", "w1", "t2", now());
        b.name = Some("Other".to_string());
        b.followers = 1.0;
        let rows = aggregate(&[a, b]);
        assert_eq!(rows[0].name.as_deref(), Some("Orangie"));
        assert_close(rows[0].followers, 279.0);
        assert_close(rows[0].avg_entry_usd, 212_000.0);
    }

    #[test]
    fn test_window_drops_wallets_without_in_window_records() {
        let records = vec![
            record("1", "w1", "t1", now() - Duration::days(1)),
            record("2", "w2", "t1", now() - Duration::days(12)),
        ];
        let rows = aggregate_window(&records, TimeWindow::Weekly, now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].wallet, "w1");
    }

    #[test]
    fn test_unique_tokens_counts_full_history() {
        let records = vec![
            record("1", "w1", "t1", now() - Duration::days(1)),
            record("2", "w1", "t2", now() - Duration::days(20)),
            record("3", "w1", "t1", now() - Duration::days(2)),
            record("4", "w1", "t3", now() - Duration::days(60)),
        ];
        let rows = aggregate_window(&records, TimeWindow::Weekly, now());
        assert_eq!(rows[0].buys, 2);
        assert_eq!(rows[0].unique_tokens, 3);
    }

    #[test]
    fn test_additive_invariant_over_window() {
        let mut records = Vec::new();
        for i in 0..12u32 {
            let mut r = record(
                &i.to_string(),
                &format!("w{}", i % 4),
                &format!("t{}", i % 3),
                now() - Duration::days(i64::from(i)),
            );
            r.buys = i;
            r.sells = 12 - i;
            r.invested_sol = f64::from(i) * 1.5;
            r.realized_pnl = f64::from(i) - 6.0;
            records.push(r);
        }
        for window in TimeWindow::ALL {
            let in_window = filter_window(&records, window, now());
            let rows = aggregate_window(&records, window, now());

            let distinct: HashSet<&str> = in_window.iter().map(|r| r.wallet.as_str()).collect();
            assert_eq!(rows.len(), distinct.len());

            let buys: u64 = in_window.iter().map(|r| u64::from(r.buys)).sum();
            let sells: u64 = in_window.iter().map(|r| u64::from(r.sells)).sum();
            let invested: f64 = in_window.iter().map(|r| r.invested_sol).sum();
            let pnl: f64 = in_window.iter().map(|r| r.realized_pnl).sum();
            assert_eq!(rows.iter().map(|r| r.buys).sum::<u64>(), buys);
            assert_eq!(rows.iter().map(|r| r.sells).sum::<u64>(), sells);
            assert_close(rows.iter().map(|r| r.invested_sol).sum(), invested);
            assert_close(rows.iter().map(|r| r.realized_pnl).sum(), pnl);
        }
    }

    #[test]
    fn test_bad_record_does_not_break_aggregation() {
        let mut bad = record("1", "w1", "t1", now());
        bad.last_trade = "??".to_string();
        let records = vec![bad, record("2", "w2", "t1", now())];
        let rows = aggregate_window(&records, TimeWindow::AllTime, now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].wallet, "w2");
    }

    #[test]
    fn test_wallet_summary_for_window() {
        let records = vec![
            record("1", "w1", "t1", now() - Duration::days(3)),
            record("2", "w1", "t2", now() - Duration::days(45)),
            record("3", "w2", "t1", now()),
        ];
        let own = wallet_records(&records, "w1");
        let weekly = wallet_summary(&own, TimeWindow::Weekly, now()).unwrap();
        assert_eq!(weekly.wallet, "w1");
        assert_eq!(weekly.trades_total(), 2);
        assert_eq!(weekly.unique_tokens, 2, "the 45-day-old token still counts");
        assert!(wallet_summary(&own, TimeWindow::Daily, now()).is_none());
        assert_eq!(token_count(own.iter().copied()), 2);

        let nobody = wallet_records(&records, "nobody");
        assert!(wallet_summary(&nobody, TimeWindow::AllTime, now()).is_none());
        assert_eq!(token_count(nobody.iter().copied()), 0);
    }

    #[test]
    fn test_aggregate_tokens_groups_by_address() {
        let mut a = record("1", "w1", "bonk", now() - Duration::hours(2));
        a.roi = 10.0;
        let mut b = record("2", "w1", "wif", now());
        b.roi = 30.0;
        let mut c = record("3", "w1", "bonk", now());
        c.roi = 30.0;
        let tokens = aggregate_tokens(&[a, b, c]);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_address, "bonk-mint");
        assert_eq!(tokens[0].token_name, "BONK");
        assert_eq!(tokens[0].buys, 2);
        assert_close(tokens[0].roi, 20.0);
        assert_close(tokens[0].hold_minutes(), 180.0);
        assert_eq!(tokens[1].token_address, "wif-mint");
    }
}
