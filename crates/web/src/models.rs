//! View models for the leaderboard templates.
//! Every value a template prints is already formatted here; templates only
//! lay strings out.

/// A link that is highlighted when selected (window buttons, profile tabs).
pub struct NavLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Clickable column header. `indicator` is empty unless the table is sorted
/// on this column.
pub struct SortHeader {
    pub label: &'static str,
    pub href: String,
    pub indicator: &'static str,
}

pub struct Pager {
    /// 1-based for display.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Row of the main leaderboard.
pub struct LeaderboardRow {
    pub rank: usize,
    /// `gold`, `silver`, `bronze` or empty.
    pub badge: &'static str,
    pub profile_href: String,
    pub name: String,
    pub avatar: Option<String>,
    pub wallet_short: String,
    pub followers: String,
    pub tokens: String,
    pub win_rate: String,
    pub roi: String,
    pub trades: String,
    pub avg_buy: String,
    pub avg_entry: String,
    pub avg_hold: String,
    pub realized_pnl: String,
    pub realized_pnl_usd: String,
    /// `positive`, `negative` or `neutral`.
    pub pnl_tone: &'static str,
}

pub struct LeaderboardView {
    pub window: &'static str,
    pub sort: &'static str,
    pub dir: &'static str,
    pub query: String,
    pub window_links: Vec<NavLink>,
    pub headers: Vec<SortHeader>,
    pub rows: Vec<LeaderboardRow>,
    pub pager: Pager,
}

pub struct ProfileHeader {
    pub name: String,
    pub avatar: Option<String>,
    pub wallet: String,
    pub wallet_short: String,
    pub x_handle: Option<String>,
    pub x_href: Option<String>,
    pub followers: String,
    pub last_trade: String,
}

/// One cell of the profile stats grid.
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub detail: Option<String>,
    pub tone: &'static str,
}

/// Row of the profile table, either one raw record (Trades tab) or one token
/// folded over the window (Tokens tab).
pub struct TokenRow {
    pub rank: usize,
    pub token_name: String,
    pub token_short: String,
    pub last_trade: String,
    pub invested: String,
    pub invested_usd: String,
    pub realized_pnl: String,
    pub realized_pnl_usd: String,
    pub pnl_tone: &'static str,
    pub roi: String,
    pub trades: String,
    pub avg_entry: String,
    pub held: String,
}

pub struct ProfileView {
    pub header: ProfileHeader,
    pub window: &'static str,
    pub tab: &'static str,
    pub sort: &'static str,
    pub dir: &'static str,
    pub query: String,
    pub window_links: Vec<NavLink>,
    pub tab_links: Vec<NavLink>,
    pub stats: Vec<StatCard>,
    pub has_window_activity: bool,
    pub headers: Vec<SortHeader>,
    pub rows: Vec<TokenRow>,
    pub pager: Pager,
}
