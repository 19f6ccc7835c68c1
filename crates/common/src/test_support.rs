//! Fixtures shared by unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::types::TradeRecord;

/// Fixed reference instant: 2025-01-15 12:00:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

/// A record whose activity window is the hour before `last`.
pub fn record(id: &str, wallet: &str, token: &str, last: DateTime<Utc>) -> TradeRecord {
    TradeRecord {
        id: id.to_string(),
        wallet: wallet.to_string(),
        token_name: token.to_uppercase(),
        token_address: format!("{token}-mint"),
        first_trade: (last - Duration::hours(1)).to_rfc3339(),
        last_trade: last.to_rfc3339(),
        buys: 1,
        sells: 1,
        invested_sol: 1.0,
        invested_sol_usd: 200.0,
        realized_pnl: 0.5,
        realized_pnl_usd: 100.0,
        roi: 50.0,
        name: None,
        avatar: None,
        followers: 0.0,
        avg_entry_usd: 0.0,
    }
}
