//! Unit tests for the SQLite tick and alert-rule store.

#[cfg(test)]
mod store_tests {
    use crate::data::store::{Database, Tick};

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db
    }

    fn tick(symbol: &str, timestamp: i64, price: f64) -> Tick {
        Tick {
            timestamp,
            symbol: symbol.to_string(),
            price,
            quantity: 1.0,
        }
    }

    #[test]
    fn test_append_and_latest() {
        let db = db();
        db.append_tick(&tick("BTCUSDT", 1_000, 42_000.0)).unwrap();
        db.append_tick(&tick("BTCUSDT", 2_000, 42_100.0)).unwrap();
        db.append_tick(&tick("ETHUSDT", 3_000, 2_200.0)).unwrap();

        let latest = db.latest_tick("BTCUSDT").unwrap().unwrap();
        assert_eq!(latest.timestamp, 2_000);
        assert_eq!(latest.price, 42_100.0);
    }

    #[test]
    fn test_latest_missing_symbol() {
        let db = db();
        assert!(db.latest_tick("BTCUSDT").unwrap().is_none());
    }

    #[test]
    fn test_latest_breaks_timestamp_ties_by_insertion_order() {
        let db = db();
        db.append_tick(&tick("BTCUSDT", 1_000, 10.0)).unwrap();
        db.append_tick(&tick("BTCUSDT", 1_000, 11.0)).unwrap();
        let latest = db.latest_tick("BTCUSDT").unwrap().unwrap();
        assert_eq!(latest.price, 11.0);
    }

    #[test]
    fn test_recent_ticks_chronological_and_limited() {
        let db = db();
        for i in 0..10 {
            db.append_tick(&tick("BTCUSDT", 1_000 + i, 100.0 + i as f64))
                .unwrap();
            db.append_tick(&tick("ETHUSDT", 1_000 + i, 10.0 + i as f64))
                .unwrap();
        }

        let ticks = db.recent_ticks(&["BTCUSDT", "ETHUSDT"], 6).unwrap();
        assert_eq!(ticks.len(), 6);
        // Chronological order, and only the most recent ticks survive the limit.
        for pair in ticks.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert_eq!(ticks.last().unwrap().timestamp, 1_009);
    }

    #[test]
    fn test_recent_ticks_filters_symbols() {
        let db = db();
        db.append_tick(&tick("BTCUSDT", 1_000, 1.0)).unwrap();
        db.append_tick(&tick("SOLUSDT", 1_001, 2.0)).unwrap();
        let ticks = db.recent_ticks(&["BTCUSDT"], 100).unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_alert_row_roundtrip() {
        let db = db();
        let rule = db
            .insert_alert("BTCUSDT/ETHUSDT", "z_score", "greater_than", 2.0)
            .unwrap();
        assert_eq!(rule.status, "active");
        assert_eq!(rule.value, 2.0);
        assert!(!rule.created_at.is_empty());

        let found = db
            .find_alert_by_key("BTCUSDT/ETHUSDT", "z_score", "greater_than", 2.0)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, rule.id);
    }

    #[test]
    fn test_alert_status_update_and_filter() {
        let db = db();
        let rule = db
            .insert_alert("BTCUSDT/ETHUSDT", "z_score", "less_than", 1.5)
            .unwrap();
        assert_eq!(db.active_alerts(None).unwrap().len(), 1);

        db.set_alert_status(rule.id, "triggered").unwrap();
        assert!(db.active_alerts(None).unwrap().is_empty());
        assert!(db
            .active_alerts(Some("BTCUSDT/ETHUSDT"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_alert_is_noop_for_missing_id() {
        let db = db();
        db.delete_alert(9_999).unwrap();
    }
}
