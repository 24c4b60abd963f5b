//! Unit tests for OHLC resampling and pair alignment.

#[cfg(test)]
mod resample_tests {
    use crate::analytics::resample::{align, resample, Timeframe};
    use crate::data::store::Tick;

    fn tick(timestamp: i64, price: f64) -> Tick {
        Tick {
            timestamp,
            symbol: "BTCUSDT".to_string(),
            price,
            quantity: 1.0,
        }
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!(Timeframe::parse("1s").unwrap().bucket_ms(), 1_000);
        assert_eq!(Timeframe::parse("1m").unwrap().bucket_ms(), 60_000);
        assert_eq!(Timeframe::parse("5m").unwrap().bucket_ms(), 300_000);
        assert!(Timeframe::parse("15m").is_err());
    }

    #[test]
    fn test_ohlc_within_bucket() {
        let ticks = vec![tick(0, 10.0), tick(200, 12.0), tick(400, 9.0), tick(900, 11.0)];
        let bars = resample(&ticks, 1_000);
        assert_eq!(bars.len(), 1);
        let bar = bars[0];
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.high, 12.0);
        assert_eq!(bar.low, 9.0);
        assert_eq!(bar.close, 11.0);
    }

    #[test]
    fn test_forward_fill_between_trades() {
        // Trades at t=0s (price 10) and t=5s (price 12); buckets 1..4
        // must carry close=10 in all four fields.
        let ticks = vec![tick(0, 10.0), tick(5_000, 12.0)];
        let bars = resample(&ticks, 1_000);
        assert_eq!(bars.len(), 6);
        for bar in &bars[1..5] {
            assert_eq!(bar.open, 10.0);
            assert_eq!(bar.high, 10.0);
            assert_eq!(bar.low, 10.0);
            assert_eq!(bar.close, 10.0);
        }
        assert_eq!(bars[5].close, 12.0);
    }

    #[test]
    fn test_nothing_emitted_before_first_trade() {
        let ticks = vec![tick(10_000, 5.0)];
        let bars = resample(&ticks, 1_000);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, 10_000);
    }

    #[test]
    fn test_resample_idempotent_on_bucketed_input() {
        let ticks = vec![tick(0, 10.0), tick(1_000, 11.0), tick(2_000, 12.0)];
        let once = resample(&ticks, 1_000);
        // Feed the bar closes back in as one tick per bucket.
        let rebucketed: Vec<Tick> = once.iter().map(|b| tick(b.timestamp, b.close)).collect();
        let twice = resample(&rebucketed, 1_000);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_align_intersects_on_timestamp() {
        let y = resample(&[tick(0, 1.0), tick(1_000, 2.0), tick(2_000, 3.0)], 1_000);
        let x = resample(&[tick(1_000, 10.0), tick(2_000, 20.0), tick(3_000, 30.0)], 1_000);
        let aligned = align(&y, &x);
        assert_eq!(aligned.timestamps, vec![1_000, 2_000]);
        assert_eq!(aligned.y_close(), vec![2.0, 3.0]);
        assert_eq!(aligned.x_close(), vec![10.0, 20.0]);
    }

    #[test]
    fn test_aligned_timestamps_strictly_increasing() {
        let y = resample(&[tick(0, 1.0), tick(5_000, 2.0)], 1_000);
        let x = resample(&[tick(0, 3.0), tick(5_000, 4.0)], 1_000);
        let aligned = align(&y, &x);
        assert_eq!(aligned.len(), 6);
        for pair in aligned.timestamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_check_window_insufficient() {
        let y = resample(&[tick(0, 1.0)], 1_000);
        let x = resample(&[tick(0, 2.0)], 1_000);
        let aligned = align(&y, &x);
        let err = aligned.check_window(50).unwrap_err();
        assert!(err.is_insufficient_data());
    }
}
