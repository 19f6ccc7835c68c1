use anyhow::Result;
use serde::Deserialize;
use std::str::FromStr;

use crate::ranking::{SortKey, TokenSortKey};
use crate::types::{SortDirection, TimeWindow};

/// Config file read when `POTION_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub source: SourceConfig,
    pub web: Option<Web>,
    #[serde(default)]
    pub leaderboard: Leaderboard,
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    pub path: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

impl Default for Web {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Leaderboard {
    pub default_window: TimeWindow,
    pub default_sort: SortKey,
    pub default_direction: SortDirection,
    pub page_size: usize,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self {
            default_window: TimeWindow::Daily,
            default_sort: SortKey::Followers,
            default_direction: SortDirection::Ascending,
            page_size: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Profile {
    pub default_sort: TokenSortKey,
    pub default_direction: SortDirection,
    pub page_size: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            default_sort: TokenSortKey::Invested,
            default_direction: SortDirection::Descending,
            page_size: 20,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("POTION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {path}: {e}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// `[web]` or its defaults.
    pub fn web_or_default(&self) -> Web {
        self.web.clone().unwrap_or_default()
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
