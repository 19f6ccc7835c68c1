//! Process-wide record set. Loaded once in the background; request handlers
//! read cheap snapshots.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::source::{self, LoadReport, TradeSource};
use crate::types::TradeRecord;

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<[TradeRecord]>),
    Failed(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Single writer (the load task), any number of readers.
#[derive(Clone)]
pub struct TraderStore {
    tx: Arc<watch::Sender<LoadState>>,
}

impl Default for TraderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TraderStore {
    pub fn new() -> Self {
        Self::with_state(LoadState::Loading)
    }

    /// Store that is already loaded with `records`.
    pub fn ready(records: Vec<TradeRecord>) -> Self {
        Self::with_state(LoadState::Ready(records.into()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_state(LoadState::Failed(message.into()))
    }

    fn with_state(state: LoadState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Current state. `Ready` clones only the `Arc`.
    pub fn snapshot(&self) -> LoadState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.tx.subscribe()
    }

    /// Resolves once the state is no longer `Loading`.
    pub async fn settled(&self) -> LoadState {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so this only errs if it was dropped.
        let _ = rx.wait_for(|s| !matches!(s, LoadState::Loading)).await;
        self.snapshot()
    }

    fn finish(&self, result: source::Result<LoadReport>) {
        match result {
            Ok(report) => {
                metrics::gauge!("potion_records_loaded").set(report.records.len() as f64);
                info!(
                    loaded = report.records.len(),
                    rejected = report.rejected,
                    "record store ready"
                );
                self.tx.send_replace(LoadState::Ready(report.records.into()));
            }
            Err(e) => {
                metrics::counter!("potion_source_load_failures_total").increment(1);
                error!(error = %e, "loading trade records failed");
                self.tx.send_replace(LoadState::Failed(e.to_string()));
            }
        }
    }

    /// Fetch `source` once in a background task. Cancelling `cancel` before the
    /// fetch completes abandons it and leaves the state untouched.
    pub fn spawn_load<S>(&self, source: S, cancel: CancellationToken) -> JoinHandle<()>
    where
        S: TradeSource + Send + Sync + 'static,
    {
        let store = self.clone();
        tokio::spawn(async move {
            info!(source = %source.describe(), "loading trade records");
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("record load cancelled");
                }
                result = source::load(&source) => store.finish(result),
            }
        })
    }
}
