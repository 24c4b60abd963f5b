//! Unit tests for configuration loading and defaults.

#[cfg(test)]
mod config_tests {
    use crate::config::AppConfig;

    #[test]
    fn test_default_symbols() {
        let config = AppConfig::default();
        let symbols = config.supported_symbols();
        assert_eq!(symbols.len(), 5);
        assert!(symbols.contains(&"BTCUSDT".to_string()));
        assert!(symbols.contains(&"DOGEUSDT".to_string()));
    }

    #[test]
    fn test_is_supported() {
        let config = AppConfig::default();
        assert!(config.is_supported("ETHUSDT"));
        assert!(!config.is_supported("XRPUSDT"));
    }

    #[test]
    fn test_default_limits() {
        let config = AppConfig::default();
        assert_eq!(config.analytics.chart_tick_limit, 200_000);
        assert_eq!(config.analytics.session_tick_limit, 100_000);
        assert_eq!(config.analytics.live_cadence_ms, 500);
        assert_eq!(config.feed.reconnect_delay_secs, 5);
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = r#"
symbols:
  - symbol: BTCUSDT
    name: Bitcoin
    link: "https://example.com/btc.png"
database_path: "/tmp/test.db"
bind_addr: "127.0.0.1:9000"
feed:
  stream_base_url: "wss://stream.example.com/stream"
  reconnect_delay_secs: 3
analytics:
  chart_tick_limit: 1000
  session_tick_limit: 500
  live_cadence_ms: 250
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.symbols.len(), 1);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.feed.reconnect_delay_secs, 3);
        assert_eq!(config.analytics.live_cadence_ms, 250);
    }
}
