//! Upstream trade-feed ingestion.
//!
//! One long-lived task holds the combined-stream connection for every
//! supported symbol, parses trade events and appends them to the tick
//! store. Any failure waits out the reconnect delay and tries again;
//! ingestion is never fatal to the process.

pub mod message;

use futures_util::{SinkExt, StreamExt};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::data::store::Database;
use crate::error::{QuantStreamError, Result};
use message::parse_trade;

pub struct Ingestor {
    db: Database,
    stream_url: String,
    reconnect_delay: Duration,
}

impl Ingestor {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        let streams: Vec<String> = config
            .supported_symbols()
            .iter()
            .map(|s| format!("{}@trade", s.to_lowercase()))
            .collect();
        let stream_url = format!("{}?streams={}", config.feed.stream_base_url, streams.join("/"));
        Self {
            db,
            stream_url,
            reconnect_delay: Duration::from_secs(config.feed.reconnect_delay_secs),
        }
    }

    /// Runs forever: connect, drain, reconnect on any failure.
    pub async fn run(self) {
        info!("Starting ingestor: {}", self.stream_url);
        loop {
            match self.connect_and_drain().await {
                Ok(()) => warn!(
                    "Ingestor connection closed. Reconnecting in {:?}...",
                    self.reconnect_delay
                ),
                Err(e) => error!(
                    "Ingestor connection failed: {}. Reconnecting in {:?}...",
                    e, self.reconnect_delay
                ),
            }
            sleep(self.reconnect_delay).await;
        }
    }

    /// One connection's lifetime: subscribe via URL, then a single
    /// receive loop until the stream ends or errors.
    async fn connect_and_drain(&self) -> Result<()> {
        let (ws_stream, _) = connect_async(self.stream_url.as_str())
            .await
            .map_err(|e| QuantStreamError::Feed(format!("connect failed: {e}")))?;
        info!("Ingestor connected");
        let (mut write, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => self.handle_frame(&text),
                Ok(Message::Ping(payload)) => {
                    write.send(Message::Pong(payload)).await.ok();
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    return Err(QuantStreamError::Feed(format!("stream error: {e}")));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Malformed frames are dropped individually; storage errors are
    /// logged and never break the connection.
    fn handle_frame(&self, text: &str) {
        let tick = match parse_trade(text) {
            Ok(Some(tick)) => tick,
            Ok(None) => return,
            Err(e) => {
                warn!("Dropping malformed feed message: {}", e);
                return;
            }
        };
        if let Err(e) = self.db.append_tick(&tick) {
            error!("Failed to store tick for {}: {}", tick.symbol, e);
        }
    }
}
