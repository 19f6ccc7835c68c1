use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One row of the static leaderboard source: a wallet's activity in a single token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub wallet: String,
    pub token_name: String,
    pub token_address: String,
    /// Raw timestamp; parsed lazily by the window filter so a bad value only
    /// drops this record from windowed views.
    pub first_trade: String,
    pub last_trade: String,
    pub buys: u32,
    pub sells: u32,
    pub invested_sol: f64,
    pub invested_sol_usd: f64,
    pub realized_pnl: f64,
    pub realized_pnl_usd: f64,
    pub roi: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub followers: f64,
    #[serde(default)]
    pub avg_entry_usd: f64,
}

impl TradeRecord {
    /// Structural checks applied at load time. Timestamps are only checked for
    /// ordering when both parse; unparseable ones are left to the window filter.
    pub fn validate(&self) -> Result<(), String> {
        if self.wallet.trim().is_empty() {
            return Err("empty wallet".to_string());
        }
        let amounts = [
            ("invested_sol", self.invested_sol),
            ("invested_sol_usd", self.invested_sol_usd),
            ("avg_entry_usd", self.avg_entry_usd),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a non-negative number, got {value}"));
            }
        }
        if let (Some(first), Some(last)) = (
            crate::window::parse_timestamp(&self.first_trade),
            crate::window::parse_timestamp(&self.last_trade),
        ) {
            if first > last {
                return Err(format!(
                    "first_trade {} is after last_trade {}",
                    self.first_trade, self.last_trade
                ));
            }
        }
        Ok(())
    }
}

/// Interval a leaderboard or profile view is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeWindow {
    #[default]
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::AllTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "all-time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::AllTime => "All-Time",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "all-time" | "all_time" | "alltime" | "all" => Ok(Self::AllTime),
            other => Err(format!("unknown time window: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json() -> &'static str {
        r#"{
            "id": "1",
            "wallet": "6sdE9CabcdD4Sca",
            "token_name": "BONK",
            "token_address": "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            "first_trade": "2025-01-10T08:00:00Z",
            "last_trade": "2025-01-15T09:30:00Z",
            "buys": 2,
            "sells": 1,
            "invested_sol": 10.5,
            "invested_sol_usd": 2100.0,
            "realized_pnl": -1.25,
            "realized_pnl_usd": -250.0,
            "roi": -11.9,
            "name": "Orangie",
            "followers": 279,
            "avg_entry_usd": 212000
        }"#
    }

    #[test]
    fn test_trade_record_decodes_snake_case_fields() {
        let record: TradeRecord = serde_json::from_str(record_json()).unwrap();
        assert_eq!(record.wallet, "6sdE9CabcdD4Sca");
        assert_eq!(record.buys, 2);
        assert_eq!(record.sells, 1);
        assert_eq!(record.name.as_deref(), Some("Orangie"));
        assert!(record.avatar.is_none());
        assert!((record.followers - 279.0).abs() < f64::EPSILON);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_negative_counts_fail_to_decode() {
        let json = record_json().replace("\"buys\": 2", "\"buys\": -2");
        assert!(serde_json::from_str::<TradeRecord>(&json).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_activity_window() {
        let mut record: TradeRecord = serde_json::from_str(record_json()).unwrap();
        record.first_trade = "2025-02-01T00:00:00Z".to_string();
        let err = record.validate().unwrap_err();
        assert!(err.contains("after last_trade"));
    }

    #[test]
    fn test_validate_rejects_negative_investment() {
        let mut record: TradeRecord = serde_json::from_str(record_json()).unwrap();
        record.invested_sol = -1.0;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_leaves_bad_timestamps_to_window_filter() {
        let mut record: TradeRecord = serde_json::from_str(record_json()).unwrap();
        record.last_trade = "not a date".to_string();
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_time_window_round_trips_through_str() {
        for window in TimeWindow::ALL {
            assert_eq!(window.as_str().parse::<TimeWindow>().unwrap(), window);
        }
        assert!("yearly".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_time_window_serde_uses_kebab_case() {
        let json = serde_json::to_string(&TimeWindow::AllTime).unwrap();
        assert_eq!(json, "\"all-time\"");
    }

    #[test]
    fn test_sort_direction_parse_and_flip() {
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert_eq!(SortDirection::Ascending.flipped(), SortDirection::Descending);
        assert_eq!(SortDirection::Descending.flipped(), SortDirection::Ascending);
    }
}
