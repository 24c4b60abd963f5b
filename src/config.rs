use serde::{Deserialize, Serialize};
use std::fs;

/// Display metadata for a supported symbol, served to the UI as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolDetail {
    pub symbol: String,
    pub name: String,
    pub link: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeedConfig {
    /// Combined-stream base, e.g. "wss://stream.binance.com:9443/stream".
    pub stream_base_url: String,
    /// Seconds to wait before reconnecting after any feed failure.
    pub reconnect_delay_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// Raw ticks fetched for a historical chart query (pair total).
    pub chart_tick_limit: usize,
    /// Raw ticks fetched to freeze a live session's historical parameters.
    pub session_tick_limit: usize,
    /// Live update cadence in milliseconds.
    pub live_cadence_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub symbols: Vec<SymbolDetail>,
    pub database_path: String,
    pub bind_addr: String,
    pub feed: FeedConfig,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    /// Loads config.yaml if present, otherwise falls back to defaults.
    pub fn load() -> Self {
        match fs::read_to_string("config.yaml") {
            Ok(content) => {
                // Strip BOM if present
                let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
                serde_yaml::from_str(content).expect("Failed to parse config.yaml")
            }
            Err(_) => Self::default(),
        }
    }

    pub fn supported_symbols(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn is_supported(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s.symbol == symbol)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let detail = |symbol: &str, name: &str, link: &str| SymbolDetail {
            symbol: symbol.to_string(),
            name: name.to_string(),
            link: link.to_string(),
        };
        Self {
            symbols: vec![
                detail(
                    "BTCUSDT",
                    "Bitcoin",
                    "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
                ),
                detail(
                    "ETHUSDT",
                    "Ethereum",
                    "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
                ),
                detail(
                    "SOLUSDT",
                    "Solana",
                    "https://assets.coingecko.com/coins/images/4128/large/solana.png",
                ),
                detail(
                    "BNBUSDT",
                    "BNB",
                    "https://assets.coingecko.com/coins/images/825/large/bnb-icon2_2x.png",
                ),
                detail(
                    "DOGEUSDT",
                    "Dogecoin",
                    "https://assets.coingecko.com/coins/images/5/large/dogecoin.png",
                ),
            ],
            database_path: "database_storage/quantstreamdb.db".to_string(),
            bind_addr: "127.0.0.1:8000".to_string(),
            feed: FeedConfig {
                stream_base_url: "wss://stream.binance.com:9443/stream".to_string(),
                reconnect_delay_secs: 5,
            },
            analytics: AnalyticsConfig {
                chart_tick_limit: 200_000,
                session_tick_limit: 100_000,
                live_cadence_ms: 500,
            },
        }
    }
}
