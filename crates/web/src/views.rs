//! Builds view models from a record snapshot and the request's query string.
//! Everything here is a pure function of its inputs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use common::aggregate::{
    aggregate_tokens, aggregate_window, record_hold_minutes, token_count, wallet_records,
    wallet_summary, AggregatedToken, AggregatedTrader,
};
use common::config::{Leaderboard, Profile};
use common::format::{
    format_avg_entry_usd, format_hold_duration, format_market_cap, format_percent,
    format_signed_token_amount, format_time_ago, format_token_amount, format_usd,
    truncate_address,
};
use common::ranking::{sort_and_rank, Page, SortConfig, SortKey, TokenSortKey};
use common::search::filter_rows;
use common::types::{SortDirection, TimeWindow, TradeRecord};
use common::window::{is_in_window, parse_timestamp};

use crate::models::{
    LeaderboardRow, LeaderboardView, NavLink, Pager, ProfileHeader, ProfileView, SortHeader,
    StatCard, TokenRow,
};

pub const DEFAULT_NAME: &str = "Anonymous Trader";

const LEADERBOARD_COLUMNS: [(SortKey, &str); 10] = [
    (SortKey::Name, "Trader"),
    (SortKey::Followers, "Followers"),
    (SortKey::TokenCount, "Tokens"),
    (SortKey::WinRate, "Win Rate"),
    (SortKey::Roi, "ROI"),
    (SortKey::TradesTotal, "Trades"),
    (SortKey::AvgBuy, "Avg Buy"),
    (SortKey::AvgEntry, "Avg Entry"),
    (SortKey::AvgHold, "Avg Hold"),
    (SortKey::RealizedPnl, "Realized PNL"),
];

const TOKEN_COLUMNS: [(TokenSortKey, &str); 8] = [
    (TokenSortKey::Name, "Token"),
    (TokenSortKey::LastTrade, "Last Trade"),
    (TokenSortKey::Invested, "Invested"),
    (TokenSortKey::RealizedPnl, "Realized PNL"),
    (TokenSortKey::Roi, "ROI"),
    (TokenSortKey::Trades, "Trades"),
    (TokenSortKey::AvgEntry, "Avg Entry"),
    (TokenSortKey::Held, "Held"),
];

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub window: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub window: Option<String>,
    pub tab: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<String>,
    pub q: Option<String>,
}

/// A query value parsed as `T`, or `default` when missing or not understood.
fn param_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::debug!(value, "ignoring unrecognised query value");
            default
        }
    }
}

/// 0-based page index from the 1-based `page` parameter.
fn page_index(raw: Option<&str>) -> usize {
    param_or::<usize>(raw, 1).saturating_sub(1)
}

fn search_query(raw: Option<&String>) -> String {
    raw.map(|q| q.trim().to_string()).unwrap_or_default()
}

/// Explicit `dir`, else the configured direction when the configured column
/// is selected, else the column's first-click direction.
fn resolve_sort<K>(
    key: K,
    raw_dir: Option<&str>,
    default_key: K,
    default_dir: SortDirection,
    initial: SortDirection,
) -> SortConfig<K>
where
    K: Copy + PartialEq,
{
    let fallback = if key == default_key {
        default_dir
    } else {
        initial
    };
    SortConfig::new(key, param_or(raw_dir, fallback))
}

fn indicator<K: PartialEq>(current: &SortConfig<K>, key: &K) -> &'static str {
    if current.key != *key {
        ""
    } else if current.direction == SortDirection::Ascending {
        "▲"
    } else {
        "▼"
    }
}

fn pager<T>(page: &Page<T>, href: impl Fn(usize) -> String) -> Pager {
    Pager {
        page: page.page_index + 1,
        total_pages: page.total_pages,
        total_items: page.total_items,
        prev_href: page.has_prev().then(|| href(page.page_index - 1)),
        next_href: page.has_next().then(|| href(page.page_index + 1)),
    }
}

fn pnl_tone(x: f64) -> &'static str {
    if x > 0.0 {
        "positive"
    } else if x < 0.0 {
        "negative"
    } else {
        "neutral"
    }
}

pub fn rank_badge(rank: usize) -> &'static str {
    match rank {
        1 => "gold",
        2 => "silver",
        3 => "bronze",
        _ => "",
    }
}

fn push_query(href: &mut String, query: &str) {
    if !query.is_empty() {
        href.push_str("&q=");
        href.push_str(&urlencoding::encode(query));
    }
}

// --- Leaderboard ---

#[derive(Debug, Clone)]
pub struct LeaderboardParams {
    pub window: TimeWindow,
    pub sort: SortConfig<SortKey>,
    pub page_index: usize,
    pub query: String,
}

impl LeaderboardParams {
    pub fn resolve(q: &LeaderboardQuery, cfg: &Leaderboard) -> Self {
        let key = param_or(q.sort.as_deref(), cfg.default_sort);
        Self {
            window: param_or(q.window.as_deref(), cfg.default_window),
            sort: resolve_sort(
                key,
                q.dir.as_deref(),
                cfg.default_sort,
                cfg.default_direction,
                SortKey::INITIAL_DIRECTION,
            ),
            page_index: page_index(q.page.as_deref()),
            query: search_query(q.q.as_ref()),
        }
    }

    fn href(&self, window: TimeWindow, sort: SortConfig<SortKey>, page_index: usize) -> String {
        let mut href = format!(
            "/?window={}&sort={}&dir={}&page={}",
            window.as_str(),
            sort.key.as_str(),
            sort.direction.as_str(),
            page_index + 1
        );
        push_query(&mut href, &self.query);
        href
    }
}

fn leaderboard_row(rank: usize, t: &AggregatedTrader, window: TimeWindow) -> LeaderboardRow {
    LeaderboardRow {
        rank,
        badge: rank_badge(rank),
        profile_href: format!(
            "/trader/{}?window={}",
            urlencoding::encode(&t.wallet),
            window.as_str()
        ),
        name: t
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        avatar: t.avatar.clone(),
        wallet_short: truncate_address(&t.wallet),
        followers: format_market_cap(t.followers),
        tokens: t.unique_tokens.to_string(),
        win_rate: format_percent(t.win_rate()),
        roi: format_percent(t.roi),
        trades: format!("{}/{}", t.buys, t.sells),
        avg_buy: format_token_amount(t.invested_sol),
        avg_entry: format_avg_entry_usd(t.avg_entry_usd),
        avg_hold: format_hold_duration(t.hold_minutes()),
        realized_pnl: format_signed_token_amount(t.realized_pnl),
        realized_pnl_usd: format_usd(t.realized_pnl_usd),
        pnl_tone: pnl_tone(t.realized_pnl),
    }
}

/// Aggregate, search, sort and paginate the leaderboard.
pub fn leaderboard_view(
    records: &[TradeRecord],
    params: &LeaderboardParams,
    page_size: usize,
    now: DateTime<Utc>,
) -> LeaderboardView {
    let traders = filter_rows(aggregate_window(records, params.window, now), &params.query);
    let page = sort_and_rank(
        traders,
        params.sort.key,
        params.sort.direction,
        params.page_index,
        page_size,
    );
    let pager = pager(&page, |i| params.href(params.window, params.sort, i));

    let window_links = TimeWindow::ALL
        .iter()
        .map(|&w| NavLink {
            label: w.label(),
            href: params.href(w, params.sort, 0),
            active: w == params.window,
        })
        .collect();

    let headers = LEADERBOARD_COLUMNS
        .iter()
        .map(|&(key, label)| SortHeader {
            label,
            href: params.href(
                params.window,
                params.sort.toggled(key, SortKey::INITIAL_DIRECTION),
                0,
            ),
            indicator: indicator(&params.sort, &key),
        })
        .collect();

    let rows = page
        .items
        .iter()
        .map(|r| leaderboard_row(r.rank, &r.row, params.window))
        .collect();

    LeaderboardView {
        window: params.window.as_str(),
        sort: params.sort.key.as_str(),
        dir: params.sort.direction.as_str(),
        query: params.query.clone(),
        window_links,
        headers,
        rows,
        pager,
    }
}

// --- Trader profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileTab {
    #[default]
    Trades,
    Tokens,
}

impl ProfileTab {
    pub const ALL: [ProfileTab; 2] = [Self::Trades, Self::Tokens];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Tokens => "tokens",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Trades => "Trades",
            Self::Tokens => "Tokens",
        }
    }
}

impl FromStr for ProfileTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trades" => Ok(Self::Trades),
            "tokens" => Ok(Self::Tokens),
            other => Err(format!("unknown profile tab: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileParams {
    pub window: TimeWindow,
    pub tab: ProfileTab,
    pub sort: SortConfig<TokenSortKey>,
    pub page_index: usize,
    pub query: String,
}

impl ProfileParams {
    pub fn resolve(q: &ProfileQuery, cfg: &Profile, default_window: TimeWindow) -> Self {
        let key = param_or(q.sort.as_deref(), cfg.default_sort);
        Self {
            window: param_or(q.window.as_deref(), default_window),
            tab: param_or(q.tab.as_deref(), ProfileTab::default()),
            sort: resolve_sort(
                key,
                q.dir.as_deref(),
                cfg.default_sort,
                cfg.default_direction,
                TokenSortKey::INITIAL_DIRECTION,
            ),
            page_index: page_index(q.page.as_deref()),
            query: search_query(q.q.as_ref()),
        }
    }

    fn href(
        &self,
        wallet: &str,
        window: TimeWindow,
        tab: ProfileTab,
        sort: SortConfig<TokenSortKey>,
        page_index: usize,
    ) -> String {
        let mut href = format!(
            "/trader/{}?window={}&tab={}&sort={}&dir={}&page={}",
            urlencoding::encode(wallet),
            window.as_str(),
            tab.as_str(),
            sort.key.as_str(),
            sort.direction.as_str(),
            page_index + 1
        );
        push_query(&mut href, &self.query);
        href
    }
}

fn time_ago(raw: &str, now: DateTime<Utc>) -> String {
    parse_timestamp(raw).map_or_else(|| "-".to_string(), |t| format_time_ago(t, now))
}

fn record_row(rank: usize, r: &TradeRecord, now: DateTime<Utc>) -> TokenRow {
    TokenRow {
        rank,
        token_name: r.token_name.clone(),
        token_short: truncate_address(&r.token_address),
        last_trade: time_ago(&r.last_trade, now),
        invested: format_token_amount(r.invested_sol),
        invested_usd: format_usd(r.invested_sol_usd),
        realized_pnl: format_signed_token_amount(r.realized_pnl),
        realized_pnl_usd: format_usd(r.realized_pnl_usd),
        pnl_tone: pnl_tone(r.realized_pnl),
        roi: format_percent(r.roi),
        trades: format!("{}/{}", r.buys, r.sells),
        avg_entry: format_avg_entry_usd(r.avg_entry_usd),
        held: format_hold_duration(record_hold_minutes(r)),
    }
}

fn token_row(rank: usize, t: &AggregatedToken, now: DateTime<Utc>) -> TokenRow {
    TokenRow {
        rank,
        token_name: t.token_name.clone(),
        token_short: truncate_address(&t.token_address),
        last_trade: t
            .last_trade
            .map_or_else(|| "-".to_string(), |at| format_time_ago(at, now)),
        invested: format_token_amount(t.invested_sol),
        invested_usd: format_usd(t.invested_sol_usd),
        realized_pnl: format_signed_token_amount(t.realized_pnl),
        realized_pnl_usd: format_usd(t.realized_pnl_usd),
        pnl_tone: pnl_tone(t.realized_pnl),
        roi: format_percent(t.roi),
        trades: format!("{}/{}", t.buys, t.sells),
        avg_entry: format_avg_entry_usd(t.avg_entry_usd),
        held: format_hold_duration(t.hold_minutes()),
    }
}

/// Stats grid. A wallet without in-window activity shows zeros, with the
/// token count still taken from its full history.
fn stat_cards(summary: Option<&AggregatedTrader>, history_tokens: usize) -> Vec<StatCard> {
    let (buys, sells) = summary.map_or((0, 0), |s| (s.buys, s.sells));
    let invested = summary.map_or(0.0, |s| s.invested_sol);
    let invested_usd = summary.map_or(0.0, |s| s.invested_sol_usd);
    let pnl = summary.map_or(0.0, |s| s.realized_pnl);
    let pnl_usd = summary.map_or(0.0, |s| s.realized_pnl_usd);
    let roi = summary.map_or(0.0, |s| s.roi);

    vec![
        StatCard {
            label: "Tokens",
            value: history_tokens.to_string(),
            detail: None,
            tone: "neutral",
        },
        StatCard {
            label: "Average Buy",
            value: format!("{} SOL", format_token_amount(invested)),
            detail: None,
            tone: "neutral",
        },
        StatCard {
            label: "Total Invested",
            value: format!("{} SOL", format_token_amount(invested)),
            detail: Some(format_usd(invested_usd)),
            tone: "neutral",
        },
        StatCard {
            label: "Win Rate",
            value: format_percent(summary.map_or(0.0, AggregatedTrader::win_rate)),
            detail: None,
            tone: "neutral",
        },
        StatCard {
            label: "Average Entry",
            value: format_avg_entry_usd(summary.map_or(0.0, |s| s.avg_entry_usd)),
            detail: None,
            tone: "neutral",
        },
        StatCard {
            label: "ROI",
            value: format_percent(roi),
            detail: None,
            tone: pnl_tone(roi),
        },
        StatCard {
            label: "Trades",
            value: format!("{buys}/{sells}"),
            detail: Some(format!("{} total", buys + sells)),
            tone: "neutral",
        },
        StatCard {
            label: "Average Hold",
            value: format_hold_duration(summary.map_or(0.0, AggregatedTrader::hold_minutes)),
            detail: None,
            tone: "neutral",
        },
        StatCard {
            label: "Realized PNL",
            value: format!("{} SOL", format_signed_token_amount(pnl)),
            detail: Some(format_usd(pnl_usd)),
            tone: pnl_tone(pnl),
        },
    ]
}

/// Profile page for `wallet`; `None` when the wallet has no record at all.
pub fn profile_view(
    all: &[TradeRecord],
    wallet: &str,
    params: &ProfileParams,
    page_size: usize,
    now: DateTime<Utc>,
) -> Option<ProfileView> {
    let own = wallet_records(all, wallet);
    let head = *own.first()?;

    let name = head.name.clone().filter(|n| !n.trim().is_empty());
    let last_seen = own
        .iter()
        .filter_map(|r| parse_timestamp(&r.last_trade))
        .max();
    let header = ProfileHeader {
        name: name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string()),
        avatar: head.avatar.clone(),
        wallet: wallet.to_string(),
        wallet_short: truncate_address(wallet),
        x_handle: name.as_ref().map(|n| format!("@{}", n.to_lowercase())),
        x_href: name
            .as_ref()
            .map(|n| format!("https://x.com/{}", urlencoding::encode(&n.to_lowercase()))),
        followers: format_market_cap(head.followers),
        last_trade: last_seen.map_or_else(|| "-".to_string(), |t| format_time_ago(t, now)),
    };

    let summary = wallet_summary(&own, params.window, now);
    let stats = stat_cards(summary.as_ref(), token_count(own.iter().copied()));
    let in_window: Vec<&TradeRecord> = own
        .iter()
        .copied()
        .filter(|r| is_in_window(r, params.window, now))
        .collect();

    let (rows, page_pager) = match params.tab {
        ProfileTab::Trades => {
            let rows = filter_rows(in_window.clone(), &params.query);
            let page = sort_and_rank(
                rows,
                params.sort.key,
                params.sort.direction,
                params.page_index,
                page_size,
            );
            let pager = pager(&page, |i| {
                params.href(wallet, params.window, params.tab, params.sort, i)
            });
            let rows = page
                .items
                .iter()
                .map(|r| record_row(r.rank, r.row, now))
                .collect();
            (rows, pager)
        }
        ProfileTab::Tokens => {
            let tokens = filter_rows(aggregate_tokens(in_window.iter().copied()), &params.query);
            let page = sort_and_rank(
                tokens,
                params.sort.key,
                params.sort.direction,
                params.page_index,
                page_size,
            );
            let pager = pager(&page, |i| {
                params.href(wallet, params.window, params.tab, params.sort, i)
            });
            let rows = page
                .items
                .iter()
                .map(|r| token_row(r.rank, &r.row, now))
                .collect();
            (rows, pager)
        }
    };

    let window_links = TimeWindow::ALL
        .iter()
        .map(|&w| NavLink {
            label: w.label(),
            href: params.href(wallet, w, params.tab, params.sort, 0),
            active: w == params.window,
        })
        .collect();

    let tab_links = ProfileTab::ALL
        .iter()
        .map(|&tab| NavLink {
            label: tab.label(),
            href: params.href(wallet, params.window, tab, params.sort, 0),
            active: tab == params.tab,
        })
        .collect();

    let headers = TOKEN_COLUMNS
        .iter()
        .map(|&(key, label)| SortHeader {
            label,
            href: params.href(
                wallet,
                params.window,
                params.tab,
                params.sort.toggled(key, TokenSortKey::INITIAL_DIRECTION),
                0,
            ),
            indicator: indicator(&params.sort, &key),
        })
        .collect();

    Some(ProfileView {
        header,
        window: params.window.as_str(),
        tab: params.tab.as_str(),
        sort: params.sort.key.as_str(),
        dir: params.sort.direction.as_str(),
        query: params.query.clone(),
        window_links,
        tab_links,
        stats,
        has_window_activity: summary.is_some(),
        headers,
        rows,
        pager: page_pager,
    })
}
