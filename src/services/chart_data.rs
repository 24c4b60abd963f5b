//! Historical analytics pipeline behind the chart-data query.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use crate::analytics::adf::adf_test;
use crate::analytics::resample::{align, resample, Bar, Timeframe};
use crate::analytics::stats::{hedge_ratio, mean, rolling_correlation, spread, zscore};
use crate::config::AppConfig;
use crate::data::store::{Database, Tick};
use crate::error::{QuantStreamError, Result};

#[derive(Clone, Debug)]
pub struct ChartQuery {
    pub y_symbol: String,
    pub x_symbol: String,
    pub timeframe: String,
    pub window: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnalyticsSummary {
    pub hedge_ratio: Option<f64>,
    pub adf_p_value: Option<f64>,
    pub pair: String,
    pub spread_mean: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TimeseriesPoint {
    pub time: String,
    pub y_ohlc: Bar,
    pub x_ohlc: Bar,
    pub spread: Option<f64>,
    pub z_score: Option<f64>,
    pub rolling_corr: Option<f64>,
    pub regression_line_value: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChartDataResponse {
    pub analytics_summary: AnalyticsSummary,
    pub timeseries_data: Vec<TimeseriesPoint>,
}

/// NaN and infinities serialize as null, never a silent 0.
fn sanitize(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

pub fn iso_utc(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339(),
        None => String::new(),
    }
}

/// Validates the query shape before touching the store.
pub fn validate_pair(config: &AppConfig, y_symbol: &str, x_symbol: &str) -> Result<()> {
    for symbol in [y_symbol, x_symbol] {
        if !config.is_supported(symbol) {
            return Err(QuantStreamError::UnsupportedSymbol {
                symbol: symbol.to_string(),
            });
        }
    }
    if y_symbol == x_symbol {
        return Err(QuantStreamError::IdenticalSymbols {
            symbol: y_symbol.to_string(),
        });
    }
    Ok(())
}

/// Full historical pipeline: fetch, resample, align, regress, test,
/// correlate, and shape the response for the chart layer.
pub fn chart_data(db: &Database, config: &AppConfig, query: &ChartQuery) -> Result<ChartDataResponse> {
    validate_pair(config, &query.y_symbol, &query.x_symbol)?;
    let timeframe = Timeframe::parse(&query.timeframe)?;
    if query.window < 2 {
        return Err(QuantStreamError::InvalidWindow {
            window: query.window,
        });
    }

    let ticks = db.recent_ticks(
        &[&query.y_symbol, &query.x_symbol],
        config.analytics.chart_tick_limit,
    )?;
    let (y_ticks, x_ticks): (Vec<Tick>, Vec<Tick>) = ticks
        .into_iter()
        .partition(|t| t.symbol == query.y_symbol);

    let y_bars = resample(&y_ticks, timeframe.bucket_ms());
    let x_bars = resample(&x_ticks, timeframe.bucket_ms());
    let aligned = align(&y_bars, &x_bars);
    aligned.check_window(query.window)?;

    let y_close = aligned.y_close();
    let x_close = aligned.x_close();

    let model = hedge_ratio(&y_close, &x_close)?;
    let spread_series = spread(&y_close, &x_close, model.hedge_ratio);
    let spread_mean = mean(&spread_series);
    let z_scores = zscore(&spread_series);
    let adf = adf_test(&spread_series)?;
    let rolling_corr = rolling_correlation(&y_close, &x_close, query.window)?;

    info!(
        "Chart data for {}/{}: {} aligned points, hedge ratio {:.4}, ADF p {:.4}",
        query.y_symbol,
        query.x_symbol,
        aligned.len(),
        model.hedge_ratio,
        adf.p_value
    );

    let timeseries_data = (0..aligned.len())
        .map(|i| TimeseriesPoint {
            time: iso_utc(aligned.timestamps[i]),
            y_ohlc: aligned.y_bars[i],
            x_ohlc: aligned.x_bars[i],
            spread: sanitize(spread_series[i]),
            z_score: sanitize(z_scores[i]),
            rolling_corr: rolling_corr[i].and_then(sanitize),
            regression_line_value: sanitize(model.predict(x_close[i])),
        })
        .collect();

    Ok(ChartDataResponse {
        analytics_summary: AnalyticsSummary {
            hedge_ratio: sanitize(model.hedge_ratio),
            adf_p_value: sanitize(adf.p_value),
            pair: format!("{}/{}", query.y_symbol, query.x_symbol),
            spread_mean: sanitize(spread_mean),
        },
        timeseries_data,
    })
}
