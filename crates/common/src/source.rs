//! Where trade records come from: one JSON array, read from disk or fetched
//! over HTTP, decoded record by record.

use std::path::PathBuf;
use std::time::Instant;

use crate::config::SourceConfig;
use crate::types::TradeRecord;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of trade records, got {0}")]
    NotAnArray(&'static str),

    #[error("no record source configured: set source.path or source.url")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Produces the raw body holding the record array.
pub trait TradeSource {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
    fn fetch_body(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TradeSource for FileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch_body(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

impl TradeSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_body(&self) -> Result<String> {
        let start = Instant::now();
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        tracing::debug!(
            url = %self.url,
            bytes = body.len(),
            ms = start.elapsed().as_millis() as u64,
            "fetched trade records"
        );
        Ok(body)
    }
}

/// The source selected by `[source]`: a URL wins over a path.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    File(FileSource),
    Http(HttpSource),
}

impl ConfiguredSource {
    pub fn from_config(cfg: &SourceConfig) -> Result<Self> {
        match (cfg.url.as_deref(), cfg.path.as_deref()) {
            (Some(url), _) if !url.trim().is_empty() => Ok(Self::Http(HttpSource::new(url))),
            (_, Some(path)) if !path.trim().is_empty() => Ok(Self::File(FileSource::new(path))),
            _ => Err(SourceError::NotConfigured),
        }
    }
}

impl TradeSource for ConfiguredSource {
    fn describe(&self) -> String {
        match self {
            Self::File(s) => s.describe(),
            Self::Http(s) => s.describe(),
        }
    }

    async fn fetch_body(&self) -> Result<String> {
        match self {
            Self::File(s) => s.fetch_body().await,
            Self::Http(s) => s.fetch_body().await,
        }
    }
}

/// Outcome of decoding a record array.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<TradeRecord>,
    pub rejected: usize,
}

/// Decode `body` as an array of trade records. Elements that fail to decode
/// or violate record invariants are dropped and counted; only a body that is
/// not a JSON array at all is an error. Records with unparseable timestamps
/// are kept and reported here, once.
pub fn parse_records(body: &str) -> Result<LoadReport> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(_) => return Err(SourceError::NotAnArray("an object")),
        serde_json::Value::Null => return Err(SourceError::NotAnArray("null")),
        _ => return Err(SourceError::NotAnArray("a scalar")),
    };

    let mut report = LoadReport {
        records: Vec::with_capacity(items.len()),
        rejected: 0,
    };
    for (index, item) in items.into_iter().enumerate() {
        let record = match serde_json::from_value::<TradeRecord>(item) {
            Ok(r) => r,
            Err(e) => {
                reject(&mut report, index, "decode", &e.to_string());
                continue;
            }
        };
        if let Err(reason) = record.validate() {
            reject(&mut report, index, "invalid", &reason);
            continue;
        }
        crate::window::report_bad_timestamps(&record);
        report.records.push(record);
    }
    Ok(report)
}

fn reject(report: &mut LoadReport, index: usize, kind: &'static str, reason: &str) {
    report.rejected += 1;
    metrics::counter!("potion_records_rejected_total", "reason" => kind).increment(1);
    tracing::warn!(index, kind, reason, "rejected trade record");
}

/// Fetch and decode in one step.
pub async fn load<S: TradeSource>(source: &S) -> Result<LoadReport> {
    let body = source.fetch_body().await?;
    let report = parse_records(&body)?;
    tracing::info!(
        source = %source.describe(),
        loaded = report.records.len(),
        rejected = report.rejected,
        "trade records loaded"
    );
    Ok(report)
}
