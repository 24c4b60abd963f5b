//! Per-connection live analytics session.
//!
//! Initializing -> Streaming -> Terminated. Historical regression
//! parameters are computed once from recent history and frozen for the
//! session's lifetime, so each cadence step costs O(1): one latest-tick
//! read per symbol plus arithmetic.

use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::analytics::resample::{align, resample, Timeframe};
use crate::analytics::stats::{hedge_ratio, mean, spread, std_dev};
use crate::config::AppConfig;
use crate::data::store::{Database, Tick};
use crate::error::Result;
use crate::events::LivePacket;
use crate::services::alert_engine::AlertEngine;
use crate::services::chart_data::{iso_utc, validate_pair};

/// Minimum aligned 1s buckets required to freeze session parameters.
const MIN_HISTORY_POINTS: usize = 10;

/// Parameters frozen at session start; never recomputed afterwards.
#[derive(Clone, Copy, Debug)]
pub struct SessionParams {
    pub hedge_ratio: f64,
    pub intercept: f64,
    pub spread_mean: f64,
    pub spread_std: f64,
}

#[derive(Debug)]
pub struct LiveSession {
    db: Database,
    alerts: AlertEngine,
    y_symbol: String,
    x_symbol: String,
    pair: String,
    params: SessionParams,
    cadence: Duration,
}

impl LiveSession {
    /// Initializing state: fetch recent history, resample at 1s, align,
    /// and freeze the regression parameters. Insufficient history or an
    /// undefined regression fails initialization and the session never
    /// streams.
    pub fn initialize(
        db: Database,
        config: &AppConfig,
        y_symbol: &str,
        x_symbol: &str,
    ) -> Result<Self> {
        validate_pair(config, y_symbol, x_symbol)?;

        let ticks = db.recent_ticks(&[y_symbol, x_symbol], config.analytics.session_tick_limit)?;
        let (y_ticks, x_ticks): (Vec<Tick>, Vec<Tick>) =
            ticks.into_iter().partition(|t| t.symbol == y_symbol);

        let bucket_ms = Timeframe::S1.bucket_ms();
        let aligned = align(&resample(&y_ticks, bucket_ms), &resample(&x_ticks, bucket_ms));
        aligned.check_window(MIN_HISTORY_POINTS)?;

        let y_close = aligned.y_close();
        let x_close = aligned.x_close();
        let model = hedge_ratio(&y_close, &x_close)?;
        let hist_spread = spread(&y_close, &x_close, model.hedge_ratio);
        let params = SessionParams {
            hedge_ratio: model.hedge_ratio,
            intercept: model.intercept,
            spread_mean: mean(&hist_spread),
            spread_std: std_dev(&hist_spread),
        };

        info!(
            "[{}/{}] Session initialized: ratio={:.4}, mean={:.4}, std={:.4} ({} points)",
            y_symbol,
            x_symbol,
            params.hedge_ratio,
            params.spread_mean,
            params.spread_std,
            aligned.len()
        );

        Ok(Self {
            alerts: AlertEngine::new(db.clone()),
            db,
            y_symbol: y_symbol.to_string(),
            x_symbol: x_symbol.to_string(),
            pair: format!("{}/{}", y_symbol, x_symbol),
            params,
            cadence: Duration::from_millis(config.analytics.live_cadence_ms),
        })
    }

    pub fn params(&self) -> SessionParams {
        self.params
    }

    /// Streaming state: one update per cadence tick until the client
    /// goes away or the store fails. Cadence steps never overlap; a
    /// slow step delays the next rather than queuing.
    pub async fn run(self, tx: mpsc::Sender<LivePacket>) {
        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }

            let latest = self
                .db
                .latest_tick(&self.y_symbol)
                .and_then(|y| Ok((y, self.db.latest_tick(&self.x_symbol)?)));
            let (latest_y, latest_x) = match latest {
                Ok((Some(y), Some(x))) => (y, x),
                // No tick yet for one side: skip silently, wait for the next cadence.
                Ok(_) => continue,
                Err(e) => {
                    warn!("[{}] Live session store error: {}", self.pair, e);
                    break;
                }
            };

            let (packet, z_score) = self.compute_update(&latest_y, &latest_x);

            // Alerts ride the same channel, out of band with updates.
            match self.alerts.evaluate(&self.pair, z_score) {
                Ok(fired) => {
                    for alert in fired {
                        if tx
                            .send(LivePacket::alert(alert.message, alert.alert_id))
                            .await
                            .is_err()
                        {
                            info!("[{}] Client disconnected", self.pair);
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("[{}] Alert evaluation failed: {}", self.pair, e);
                    break;
                }
            }

            if tx.send(packet).await.is_err() {
                info!("[{}] Client disconnected", self.pair);
                break;
            }
        }
    }

    /// The cheap per-tick math against the frozen parameters.
    fn compute_update(&self, latest_y: &Tick, latest_x: &Tick) -> (LivePacket, f64) {
        let p = &self.params;
        let regression_line_value = p.intercept + p.hedge_ratio * latest_x.price;
        let current_spread = latest_y.price - p.hedge_ratio * latest_x.price;
        let z_score = if p.spread_std > 0.0 {
            (current_spread - p.spread_mean) / p.spread_std
        } else {
            0.0
        };
        let packet = LivePacket::Update {
            time: iso_utc(latest_y.timestamp),
            y_price: latest_y.price,
            x_price: latest_x.price,
            spread: current_spread,
            z_score,
            regression_line_value,
        };
        (packet, z_score)
    }
}
