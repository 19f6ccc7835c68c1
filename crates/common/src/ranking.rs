//! Sorting, pagination and positional ranking of aggregated rows.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::{record_hold_minutes, AggregatedToken, AggregatedTrader};
use crate::types::{SortDirection, TradeRecord};
use crate::window::parse_timestamp;

/// Leaderboard columns that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Followers,
    TokenCount,
    WinRate,
    Roi,
    TradesTotal,
    /// Sorted on invested amount.
    AvgBuy,
    AvgEntry,
    AvgHold,
    RealizedPnl,
    Name,
}

impl SortKey {
    /// Leaderboard headers sort ascending on first click.
    pub const INITIAL_DIRECTION: SortDirection = SortDirection::Ascending;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::TokenCount => "token_count",
            Self::WinRate => "win_rate",
            Self::Roi => "roi",
            Self::TradesTotal => "trades_total",
            Self::AvgBuy => "avg_buy",
            Self::AvgEntry => "avg_entry",
            Self::AvgHold => "avg_hold",
            Self::RealizedPnl => "realized_pnl",
            Self::Name => "name",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "followers" => Ok(Self::Followers),
            "token_count" | "tokens" | "tokencount" => Ok(Self::TokenCount),
            "win_rate" | "winrate" => Ok(Self::WinRate),
            "roi" => Ok(Self::Roi),
            "trades_total" | "trades" | "tradestotal" => Ok(Self::TradesTotal),
            "avg_buy" | "avgbuy" => Ok(Self::AvgBuy),
            "avg_entry" | "avgentry" => Ok(Self::AvgEntry),
            "avg_hold" | "avghold" => Ok(Self::AvgHold),
            "realized_pnl" | "realizedpnl" | "pnl" => Ok(Self::RealizedPnl),
            "name" | "handle" => Ok(Self::Name),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Token table columns that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSortKey {
    LastTrade,
    #[default]
    Invested,
    RealizedPnl,
    Roi,
    Trades,
    AvgEntry,
    Held,
    Name,
}

impl TokenSortKey {
    /// Token table headers sort descending on first click.
    pub const INITIAL_DIRECTION: SortDirection = SortDirection::Descending;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastTrade => "last_trade",
            Self::Invested => "invested",
            Self::RealizedPnl => "realized_pnl",
            Self::Roi => "roi",
            Self::Trades => "trades",
            Self::AvgEntry => "avg_entry",
            Self::Held => "held",
            Self::Name => "name",
        }
    }
}

impl FromStr for TokenSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_trade" | "lasttrade" => Ok(Self::LastTrade),
            "invested" => Ok(Self::Invested),
            "realized_pnl" | "realizedpnl" | "pnl" => Ok(Self::RealizedPnl),
            "roi" => Ok(Self::Roi),
            "trades" => Ok(Self::Trades),
            "avg_entry" | "avgentry" => Ok(Self::AvgEntry),
            "held" | "holding" => Ok(Self::Held),
            "name" | "token" => Ok(Self::Name),
            other => Err(format!("unknown token sort key: {other}")),
        }
    }
}

/// Current sort selection of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortConfig<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Selection after clicking the `key` header: the same column flips,
    /// another column starts at `initial`.
    pub fn toggled(self, key: K, initial: SortDirection) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, initial)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(x), SortValue::Text(y)) => x.to_string().cmp(y),
        (SortValue::Text(x), SortValue::Number(y)) => x.cmp(&y.to_string()),
    }
}

/// A row that exposes a comparable value per column of type `K`.
pub trait Sortable<K> {
    fn sort_value(&self, key: K) -> SortValue;
}

impl<K, T: Sortable<K> + ?Sized> Sortable<K> for &T {
    fn sort_value(&self, key: K) -> SortValue {
        (**self).sort_value(key)
    }
}

impl Sortable<SortKey> for AggregatedTrader {
    fn sort_value(&self, key: SortKey) -> SortValue {
        let n = match key {
            SortKey::Followers => self.followers,
            SortKey::TokenCount => self.unique_tokens as f64,
            SortKey::WinRate => self.win_rate(),
            SortKey::Roi => self.roi,
            SortKey::TradesTotal => self.trades_total() as f64,
            SortKey::AvgBuy => self.invested_sol,
            SortKey::AvgEntry => self.avg_entry_usd,
            SortKey::AvgHold => self.hold_minutes(),
            SortKey::RealizedPnl => self.realized_pnl,
            SortKey::Name => {
                let label = self.name.as_deref().unwrap_or(&self.wallet);
                return SortValue::Text(label.to_lowercase());
            }
        };
        SortValue::Number(n)
    }
}

impl Sortable<TokenSortKey> for AggregatedToken {
    fn sort_value(&self, key: TokenSortKey) -> SortValue {
        let n = match key {
            TokenSortKey::LastTrade => self
                .last_trade
                .map_or(f64::NEG_INFINITY, |t| t.timestamp() as f64),
            TokenSortKey::Invested => self.invested_sol,
            TokenSortKey::RealizedPnl => self.realized_pnl,
            TokenSortKey::Roi => self.roi,
            TokenSortKey::Trades => self.trades_total() as f64,
            TokenSortKey::AvgEntry => self.avg_entry_usd,
            TokenSortKey::Held => self.hold_minutes(),
            TokenSortKey::Name => return SortValue::Text(self.token_name.to_lowercase()),
        };
        SortValue::Number(n)
    }
}

impl Sortable<TokenSortKey> for TradeRecord {
    fn sort_value(&self, key: TokenSortKey) -> SortValue {
        let n = match key {
            TokenSortKey::LastTrade => parse_timestamp(&self.last_trade)
                .map_or(f64::NEG_INFINITY, |t| t.timestamp() as f64),
            TokenSortKey::Invested => self.invested_sol,
            TokenSortKey::RealizedPnl => self.realized_pnl,
            TokenSortKey::Roi => self.roi,
            TokenSortKey::Trades => f64::from(self.buys) + f64::from(self.sells),
            TokenSortKey::AvgEntry => self.avg_entry_usd,
            TokenSortKey::Held => record_hold_minutes(self),
            TokenSortKey::Name => return SortValue::Text(self.token_name.to_lowercase()),
        };
        SortValue::Number(n)
    }
}

/// Stable sort: rows that compare equal keep their prior relative order in
/// both directions.
pub fn sort_rows<T, K>(rows: &mut [T], key: K, direction: SortDirection)
where
    T: Sortable<K>,
    K: Copy,
{
    rows.sort_by(|a, b| {
        let ord = compare_values(&a.sort_value(key), &b.sort_value(key));
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow<T> {
    /// 1-based position in the sorted sequence.
    pub rank: usize,
    pub row: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<RankedRow<T>>,
    /// 0-based, already clamped into range.
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }
}

/// Cut one page out of an already sorted sequence. Out-of-range pages clamp to
/// the last page; an empty sequence has a single empty page.
pub fn paginate<T>(sorted: Vec<T>, page_index: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = sorted.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page_index = page_index.min(total_pages - 1);
    let offset = page_index * page_size;

    let items = sorted
        .into_iter()
        .skip(offset)
        .take(page_size)
        .enumerate()
        .map(|(pos, row)| RankedRow {
            rank: offset + pos + 1,
            row,
        })
        .collect();

    Page {
        items,
        page_index,
        page_size,
        total_items,
        total_pages,
    }
}

pub fn sort_and_rank<T, K>(
    mut rows: Vec<T>,
    key: K,
    direction: SortDirection,
    page_index: usize,
    page_size: usize,
) -> Page<T>
where
    T: Sortable<K>,
    K: Copy,
{
    sort_rows(&mut rows, key, direction);
    paginate(rows, page_index, page_size)
}
