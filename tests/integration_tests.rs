//! Integration tests: feed-shaped messages through the store into the
//! historical analytics pipeline, on a real on-disk database.

use tempfile::TempDir;

use quantstream::config::AppConfig;
use quantstream::data::store::Database;
use quantstream::error::QuantStreamError;
use quantstream::ingest::message::parse_trade;
use quantstream::services::chart_data::{chart_data, ChartQuery};

fn temp_db(dir: &TempDir) -> Database {
    let path = dir.path().join("quantstream_test.db");
    let db = Database::open(path.to_str().unwrap()).unwrap();
    db.init_schema().unwrap();
    db
}

/// Appends one feed-shaped trade frame per (symbol, second).
fn seed_from_frames(db: &Database, n: usize) {
    for i in 0..n {
        // Base aligned to a minute boundary so coarse buckets are exact.
        let t = 1_700_000_040_000u64 + (i as u64) * 1_000;
        let btc_price = 40_000.0 + 10.0 * i as f64 + (i % 5) as f64;
        let eth_price = 2_000.0 + 0.5 * i as f64 + 0.1 * (i % 7) as f64;
        for (symbol, price) in [("BTCUSDT", btc_price), ("ETHUSDT", eth_price)] {
            let frame = format!(
                r#"{{"stream":"{}@trade","data":{{"e":"trade","T":{},"s":"{}","p":"{}","q":"0.5"}}}}"#,
                symbol.to_lowercase(),
                t,
                symbol,
                price
            );
            let tick = parse_trade(&frame).unwrap().unwrap();
            db.append_tick(&tick).unwrap();
        }
    }
}

#[test]
fn test_feed_to_chart_data_end_to_end() {
    let dir = TempDir::new().unwrap();
    let db = temp_db(&dir);
    seed_from_frames(&db, 120);

    let config = AppConfig::default();
    let query = ChartQuery {
        y_symbol: "BTCUSDT".to_string(),
        x_symbol: "ETHUSDT".to_string(),
        timeframe: "1s".to_string(),
        window: 20,
    };
    let response = chart_data(&db, &config, &query).unwrap();

    let summary = &response.analytics_summary;
    assert_eq!(summary.pair, "BTCUSDT/ETHUSDT");
    let ratio = summary.hedge_ratio.unwrap();
    // Prices move ~20:1, so the regression slope lands near 20.
    assert!(ratio > 15.0 && ratio < 25.0, "ratio = {}", ratio);
    assert!(summary.adf_p_value.is_some());

    assert_eq!(response.timeseries_data.len(), 120);
    let first = &response.timeseries_data[0];
    assert!(first.rolling_corr.is_none());
    assert!(first.spread.is_some());
    assert!(first.z_score.is_some());
    let at_window = &response.timeseries_data[19];
    assert!(at_window.rolling_corr.is_some());

    // Timestamps serialize as ISO-8601 UTC, ascending.
    let mut prev = String::new();
    for point in &response.timeseries_data {
        assert!(point.time.contains('T'));
        assert!(point.time > prev);
        prev = point.time.clone();
    }
}

#[test]
fn test_chart_data_insufficient_window() {
    let dir = TempDir::new().unwrap();
    let db = temp_db(&dir);
    seed_from_frames(&db, 10);

    let config = AppConfig::default();
    let query = ChartQuery {
        y_symbol: "BTCUSDT".to_string(),
        x_symbol: "ETHUSDT".to_string(),
        timeframe: "1s".to_string(),
        window: 50,
    };
    let err = chart_data(&db, &config, &query).unwrap_err();
    assert!(matches!(
        err,
        QuantStreamError::InsufficientData { have: 10, need: 50 }
    ));
}

#[test]
fn test_chart_data_validation_faults() {
    let dir = TempDir::new().unwrap();
    let db = temp_db(&dir);
    let config = AppConfig::default();

    let mut query = ChartQuery {
        y_symbol: "NOTREAL".to_string(),
        x_symbol: "ETHUSDT".to_string(),
        timeframe: "1s".to_string(),
        window: 50,
    };
    assert!(matches!(
        chart_data(&db, &config, &query).unwrap_err(),
        QuantStreamError::UnsupportedSymbol { .. }
    ));

    query.y_symbol = "ETHUSDT".to_string();
    assert!(matches!(
        chart_data(&db, &config, &query).unwrap_err(),
        QuantStreamError::IdenticalSymbols { .. }
    ));

    query.y_symbol = "BTCUSDT".to_string();
    query.timeframe = "3m".to_string();
    assert!(matches!(
        chart_data(&db, &config, &query).unwrap_err(),
        QuantStreamError::UnsupportedTimeframe { .. }
    ));

    // A degenerate window is a request-shape fault, rejected before any
    // data is examined.
    query.timeframe = "1s".to_string();
    query.window = 1;
    let err = chart_data(&db, &config, &query).unwrap_err();
    assert!(matches!(err, QuantStreamError::InvalidWindow { window: 1 }));
    assert!(err.is_validation());
}

#[test]
fn test_coarser_timeframe_buckets_collapse() {
    let dir = TempDir::new().unwrap();
    let db = temp_db(&dir);
    // 600 seconds of ticks -> 10 one-minute buckets.
    seed_from_frames(&db, 600);

    let config = AppConfig::default();
    let query = ChartQuery {
        y_symbol: "BTCUSDT".to_string(),
        x_symbol: "ETHUSDT".to_string(),
        timeframe: "1m".to_string(),
        window: 5,
    };
    let response = chart_data(&db, &config, &query).unwrap();
    assert_eq!(response.timeseries_data.len(), 10);
    // Per-minute OHLC spans the minute's trades.
    let bar = &response.timeseries_data[0].y_ohlc;
    assert!(bar.high >= bar.open);
    assert!(bar.low <= bar.close);
    assert!(bar.high > bar.low);
}
