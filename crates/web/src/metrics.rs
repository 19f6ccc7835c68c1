use anyhow::Result;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    describe_gauge!(
        "potion_web_build_info",
        "Build info for the leaderboard web server (value is always 1)."
    );
    describe_gauge!(
        "potion_records_loaded",
        "Trade records held by the store after the last successful load."
    );
    describe_counter!(
        "potion_records_rejected_total",
        "Source elements dropped at load, labelled by reason (decode, invalid)."
    );
    describe_counter!(
        "potion_data_quality_errors_total",
        "Loaded records with an unparseable timestamp, labelled by field. Such records are outside every window."
    );
    describe_counter!(
        "potion_source_load_failures_total",
        "Record source fetches that failed."
    );
    describe_counter!("tracing_error_events", "ERROR-level tracing events.");
}

/// Install the global Prometheus recorder once and return the handle `/metrics`
/// renders from. Upkeep runs on each scrape.
pub fn init_global() -> Result<PrometheusHandle> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let handle = PROM_HANDLE.get_or_init(|| handle).clone();
    describe();

    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string());
    ::metrics::gauge!(
        "potion_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "git_sha" => git_sha,
    )
    .set(1.0);

    Ok(handle)
}
