//! Display strings for table cells.
//!
//! Every formatter is total: non-finite input returns the function's
//! placeholder instead of panicking. Breakpoints per formatter:
//!
//! | formatter | zero | small | buckets |
//! |---|---|---|---|
//! | `format_token_amount` | `0` | `<0.01` | 2 dp < 10, 1 dp < 100, integer |
//! | `format_usd` | `$0` | `<$0.01` | 2 dp < 1K, K / M / B at 1 dp |
//! | `format_avg_entry_usd` | `$0` | `<$1K` | whole K < 1M, M / B at 1 dp |
//! | `format_market_cap` | `-` | integer < 1K | K / M / B at 1 dp |
//! | `format_hold_duration` | `0m` | `Nm` < 60 | `Nh` < 1440, `Nd` |

use chrono::{DateTime, Utc};

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;
const BILLION: f64 = 1_000_000_000.0;

/// SOL-denominated amounts.
pub fn format_token_amount(x: f64) -> String {
    if !x.is_finite() {
        return "-".to_string();
    }
    let abs = x.abs();
    if abs == 0.0 {
        "0".to_string()
    } else if abs < 0.01 {
        "<0.01".to_string()
    } else if abs < 10.0 {
        format!("{x:.2}")
    } else if abs < 100.0 {
        format!("{x:.1}")
    } else {
        format!("{:.0}", x.round())
    }
}

/// Token amount with an explicit sign, for PnL cells.
pub fn format_signed_token_amount(x: f64) -> String {
    if !x.is_finite() {
        return "-".to_string();
    }
    let sign = if x < 0.0 { '-' } else { '+' };
    format!("{sign}{}", format_token_amount(x.abs()))
}

pub fn format_usd(x: f64) -> String {
    if !x.is_finite() || x == 0.0 {
        return "$0".to_string();
    }
    let sign = if x < 0.0 { "-" } else { "" };
    let abs = x.abs();
    if abs < 0.01 {
        return format!("{sign}<$0.01");
    }
    let body = if abs < THOUSAND {
        format!("{abs:.2}")
    } else if abs < MILLION {
        format!("{:.1}K", abs / THOUSAND)
    } else if abs < BILLION {
        format!("{:.1}M", abs / MILLION)
    } else {
        format!("{:.1}B", abs / BILLION)
    };
    format!("{sign}${body}")
}

/// Average entry market cap. Coarser than [`format_usd`]: everything under
/// a thousand collapses to `<$1K`.
pub fn format_avg_entry_usd(x: f64) -> String {
    if !x.is_finite() || x <= 0.0 {
        return "$0".to_string();
    }
    if x < THOUSAND {
        "<$1K".to_string()
    } else if x < MILLION {
        format!("${:.0}K", (x / THOUSAND).floor())
    } else if x < BILLION {
        format!("${:.1}M", x / MILLION)
    } else {
        format!("${:.1}B", x / BILLION)
    }
}

pub fn format_hold_duration(minutes: f64) -> String {
    if !minutes.is_finite() || minutes < 0.0 {
        return "-".to_string();
    }
    if minutes == 0.0 {
        "0m".to_string()
    } else if minutes < 60.0 {
        format!("{:.0}m", minutes.round())
    } else if minutes < 1440.0 {
        format!("{:.0}h", (minutes / 60.0).round())
    } else {
        format!("{:.0}d", (minutes / 1440.0).round())
    }
}

/// First six and last four characters joined by `...`.
pub fn truncate_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let start: String = chars.iter().take(6).collect();
    let end: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{start}...{end}")
}

pub fn format_market_cap(x: f64) -> String {
    if !x.is_finite() || x == 0.0 {
        return "-".to_string();
    }
    let abs = x.abs();
    if abs < THOUSAND {
        format!("{:.0}", x.round())
    } else if abs < MILLION {
        format!("{:.1}K", x / THOUSAND)
    } else if abs < BILLION {
        format!("{:.1}M", x / MILLION)
    } else {
        format!("{:.1}B", x / BILLION)
    }
}

pub fn format_percent(x: f64) -> String {
    if !x.is_finite() {
        return "-".to_string();
    }
    format!("{x:.2}%")
}

/// Coarse relative time, e.g. `30 min ago`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if minutes < 1440 {
        format!("{} h ago", minutes / 60)
    } else {
        format!("{} d ago", minutes / 1440)
    }
}
