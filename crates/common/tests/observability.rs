use chrono::{TimeZone, Utc};
use common::source::parse_records;
use common::types::TimeWindow;
use metrics_exporter_prometheus::PrometheusBuilder;

// Exercises the public surface end to end: a record with a broken timestamp
// is loaded and then filtered through every window while the JSON dispatcher
// and a local recorder are installed.

const BROKEN_TIMESTAMP: &str = r#"[{
    "id": "r1", "wallet": "w1", "token_name": "BONK", "token_address": "bonk-mint",
    "first_trade": "2025-01-15T10:00:00Z", "last_trade": "not a date",
    "buys": 1, "sells": 1, "invested_sol": 1.0, "invested_sol_usd": 190.0,
    "realized_pnl": 0.0, "realized_pnl_usd": 0.0, "roi": 0.0
}]"#;

#[test]
fn tracing_error_events_counter_increments_on_error_event() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let (dispatch, _otel_guard) = common::observability::build_dispatch("test-service", "info");

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::error!(foo = 123, "boom");
        });
    });

    let rendered = handle.render();
    assert!(
        rendered.contains("tracing_error_events"),
        "expected tracing_error_events in rendered metrics, got:\n{rendered}"
    );
}

#[test]
fn bad_timestamp_is_counted_as_data_quality_error() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let rows = metrics::with_local_recorder(&recorder, || {
        let (dispatch, _otel_guard) = common::observability::build_dispatch("test-service", "info");
        tracing::dispatcher::with_default(&dispatch, || {
            let report = parse_records(BROKEN_TIMESTAMP).unwrap();
            assert_eq!(report.records.len(), 1, "a bad timestamp does not reject the record");
            TimeWindow::ALL
                .into_iter()
                .flat_map(|w| common::aggregate::aggregate_window(&report.records, w, now))
                .collect::<Vec<_>>()
        })
    });

    assert!(rows.is_empty());
    // Reported once at load, not once per window evaluation.
    let rendered = handle.render();
    assert!(
        rendered.contains("potion_data_quality_errors_total{field=\"last_trade\"} 1"),
        "got:\n{rendered}"
    );
    assert!(rendered.contains("tracing_error_events"), "got:\n{rendered}");
}
