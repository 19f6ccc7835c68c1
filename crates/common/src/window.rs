//! Time-window classification of trade records.
//!
//! All calendar arithmetic is done in UTC. `daily` compares calendar dates,
//! `weekly` and `monthly` are rolling windows of 7 and 30 days ending at `now`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::types::{TimeWindow, TradeRecord};

pub const WEEKLY_DAYS: i64 = 7;
pub const MONTHLY_DAYS: i64 = 30;

/// Parse a source timestamp. Naive values are read as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Earliest `last_trade` that still counts for `window`, or `None` when the
/// window is not a rolling one.
pub fn window_start(window: TimeWindow, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match window {
        TimeWindow::Weekly => Some(now - Duration::days(WEEKLY_DAYS)),
        TimeWindow::Monthly => Some(now - Duration::days(MONTHLY_DAYS)),
        TimeWindow::Daily | TimeWindow::AllTime => None,
    }
}

/// Whether `record` contributes to aggregates for `window` at `now`.
///
/// A record whose timestamps do not parse is outside every window, all-time
/// included. Such records are reported once, at load, by
/// [`report_bad_timestamps`].
pub fn is_in_window(record: &TradeRecord, window: TimeWindow, now: DateTime<Utc>) -> bool {
    let Some(last) = parse_timestamp(&record.last_trade) else {
        return false;
    };
    if parse_timestamp(&record.first_trade).is_none() {
        return false;
    }

    match window {
        TimeWindow::Daily => last.date_naive() == now.date_naive(),
        TimeWindow::Weekly | TimeWindow::Monthly => {
            window_start(window, now).is_some_and(|start| last >= start)
        }
        TimeWindow::AllTime => true,
    }
}

/// Records of `records` inside `window`, in source order.
pub fn filter_window<'a>(
    records: &'a [TradeRecord],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<&'a TradeRecord> {
    records
        .iter()
        .filter(|r| is_in_window(r, window, now))
        .collect()
}

/// Logs and counts every timestamp of `record` that does not parse. Returns
/// whether the record is usable in any window.
pub fn report_bad_timestamps(record: &TradeRecord) -> bool {
    let mut usable = true;
    for (field, value) in [
        ("first_trade", record.first_trade.as_str()),
        ("last_trade", record.last_trade.as_str()),
    ] {
        if parse_timestamp(value).is_some() {
            continue;
        }
        usable = false;
        metrics::counter!("potion_data_quality_errors_total", "field" => field).increment(1);
        tracing::error!(
            record_id = %record.id,
            wallet = %record.wallet,
            field,
            value,
            "data quality: unparseable timestamp, record kept but outside every window"
        );
    }
    usable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{now, record};
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-15T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T10:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T09:30:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-01-15"),
            Some(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_ten_day_old_record_is_monthly_but_not_weekly() {
        let r = record("a", "w1", "t1", now() - Duration::days(10));
        assert!(!is_in_window(&r, TimeWindow::Weekly, now()));
        assert!(is_in_window(&r, TimeWindow::Monthly, now()));
        assert!(is_in_window(&r, TimeWindow::AllTime, now()));
    }

    #[test]
    fn test_daily_is_calendar_day_not_rolling() {
        // now() is 12:00 UTC; 13 hours earlier is the previous calendar day.
        let yesterday_evening = record("a", "w1", "t1", now() - Duration::hours(13));
        let this_morning = record("b", "w1", "t1", now() - Duration::hours(11));
        assert!(!is_in_window(&yesterday_evening, TimeWindow::Daily, now()));
        assert!(is_in_window(&this_morning, TimeWindow::Daily, now()));
    }

    #[test]
    fn test_weekly_boundary_is_inclusive() {
        let exactly_seven = record("a", "w1", "t1", now() - Duration::days(7));
        let just_over = record(
            "b",
            "w1",
            "t1",
            now() - Duration::days(7) - Duration::seconds(1),
        );
        assert!(is_in_window(&exactly_seven, TimeWindow::Weekly, now()));
        assert!(!is_in_window(&just_over, TimeWindow::Weekly, now()));
    }

    #[test]
    fn test_monthly_is_thirty_rolling_days() {
        let day_30 = record("a", "w1", "t1", now() - Duration::days(30));
        let day_31 = record("b", "w1", "t1", now() - Duration::days(31));
        assert!(is_in_window(&day_30, TimeWindow::Monthly, now()));
        assert!(!is_in_window(&day_31, TimeWindow::Monthly, now()));
    }

    #[test]
    fn test_unparseable_timestamp_fails_closed_everywhere() {
        let mut r = record("a", "w1", "t1", now());
        r.last_trade = "garbage".to_string();
        for window in TimeWindow::ALL {
            assert!(!is_in_window(&r, window, now()), "{window:?}");
        }

        let mut r = record("b", "w1", "t1", now());
        r.first_trade = String::new();
        assert!(!is_in_window(&r, TimeWindow::AllTime, now()));
    }

    #[test]
    fn test_report_bad_timestamps_flags_each_field() {
        let good = record("a", "w1", "t1", now());
        assert!(report_bad_timestamps(&good));

        let mut bad = record("b", "w1", "t1", now());
        bad.first_trade = "?".to_string();
        bad.last_trade = String::new();
        assert!(!report_bad_timestamps(&bad));
    }

    #[test]
    fn test_filter_window_keeps_source_order() {
        let records = vec![
            record("a", "w1", "t1", now()),
            record("b", "w2", "t1", now() - Duration::days(40)),
            record("c", "w3", "t1", now() - Duration::days(2)),
        ];
        let ids: Vec<&str> = filter_window(&records, TimeWindow::Weekly, now())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
