//! Time-bucketed OHLC resampling and pairwise alignment.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::store::Tick;
use crate::error::{QuantStreamError, Result};

/// Supported chart timeframes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeframe {
    S1,
    M1,
    M5,
}

impl Timeframe {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "1s" => Ok(Timeframe::S1),
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            other => Err(QuantStreamError::UnsupportedTimeframe {
                timeframe: other.to_string(),
            }),
        }
    }

    pub fn bucket_ms(&self) -> i64 {
        match self {
            Timeframe::S1 => 1_000,
            Timeframe::M1 => 60_000,
            Timeframe::M5 => 300_000,
        }
    }
}

/// One OHLC bucket. Forward-filled buckets carry the previous close in
/// all four fields.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bar {
    /// Bucket start, epoch milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Buckets raw ticks into OHLC bars of `bucket_ms` width.
///
/// A bucket's open/high/low/close come only from trades whose timestamp
/// floors into it. Interior buckets with no trade inherit the previous
/// close; nothing is emitted before the symbol's first trade.
pub fn resample(ticks: &[Tick], bucket_ms: i64) -> Vec<Bar> {
    let mut buckets: BTreeMap<i64, Bar> = BTreeMap::new();
    for tick in ticks {
        let start = tick.timestamp.div_euclid(bucket_ms) * bucket_ms;
        buckets
            .entry(start)
            .and_modify(|bar| {
                bar.high = bar.high.max(tick.price);
                bar.low = bar.low.min(tick.price);
                bar.close = tick.price;
            })
            .or_insert(Bar {
                timestamp: start,
                open: tick.price,
                high: tick.price,
                low: tick.price,
                close: tick.price,
            });
    }

    let mut bars = Vec::new();
    let mut prev_close: Option<f64> = None;
    let mut next_start: Option<i64> = None;
    for bar in buckets.values() {
        // Forward-fill the gap since the previous traded bucket.
        if let (Some(close), Some(mut start)) = (prev_close, next_start) {
            while start < bar.timestamp {
                bars.push(Bar {
                    timestamp: start,
                    open: close,
                    high: close,
                    low: close,
                    close,
                });
                start += bucket_ms;
            }
        }
        bars.push(*bar);
        prev_close = Some(bar.close);
        next_start = Some(bar.timestamp + bucket_ms);
    }
    bars
}

/// Two bar series restricted to bucket timestamps present in both.
#[derive(Clone, Debug)]
pub struct AlignedSeries {
    pub timestamps: Vec<i64>,
    pub y_bars: Vec<Bar>,
    pub x_bars: Vec<Bar>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn y_close(&self) -> Vec<f64> {
        self.y_bars.iter().map(|b| b.close).collect()
    }

    pub fn x_close(&self) -> Vec<f64> {
        self.x_bars.iter().map(|b| b.close).collect()
    }

    /// Distinguishes "come back with more history" from transient faults.
    pub fn check_window(&self, window: usize) -> Result<()> {
        if self.len() < window {
            return Err(QuantStreamError::InsufficientData {
                have: self.len(),
                need: window,
            });
        }
        Ok(())
    }
}

/// Intersects two bar series on bucket timestamp, discarding any bucket
/// not present (post-forward-fill) in both.
pub fn align(y_bars: &[Bar], x_bars: &[Bar]) -> AlignedSeries {
    let mut timestamps = Vec::new();
    let mut y_out = Vec::new();
    let mut x_out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < y_bars.len() && j < x_bars.len() {
        let (yt, xt) = (y_bars[i].timestamp, x_bars[j].timestamp);
        if yt == xt {
            timestamps.push(yt);
            y_out.push(y_bars[i]);
            x_out.push(x_bars[j]);
            i += 1;
            j += 1;
        } else if yt < xt {
            i += 1;
        } else {
            j += 1;
        }
    }
    AlignedSeries {
        timestamps,
        y_bars: y_out,
        x_bars: x_out,
    }
}
