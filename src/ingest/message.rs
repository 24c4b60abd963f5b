//! Typed decoding of the upstream combined-stream trade envelope.

use serde::Deserialize;

use crate::data::store::Tick;
use crate::error::{QuantStreamError, Result};

/// Combined-stream envelope: `{"stream": "...", "data": {...}}`.
/// Frames without a `data` field (subscription acks) carry no trade.
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    data: Option<TradeEvent>,
}

/// Trade payload. Price and quantity arrive as strings.
#[derive(Debug, Deserialize)]
struct TradeEvent {
    #[serde(rename = "T")]
    timestamp: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
}

/// Parses one text frame. `Ok(None)` for non-trade frames; errors for
/// frames that claim to be trades but do not decode.
pub fn parse_trade(text: &str) -> Result<Option<Tick>> {
    let envelope: StreamEnvelope = serde_json::from_str(text)?;
    let Some(event) = envelope.data else {
        return Ok(None);
    };
    let price: f64 = event
        .price
        .parse()
        .map_err(|_| QuantStreamError::Feed(format!("bad price: {}", event.price)))?;
    let quantity: f64 = event
        .quantity
        .parse()
        .map_err(|_| QuantStreamError::Feed(format!("bad quantity: {}", event.quantity)))?;
    Ok(Some(Tick {
        timestamp: event.timestamp,
        symbol: event.symbol,
        price,
        quantity,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_trade;

    #[test]
    fn parses_trade_envelope() {
        let frame = r#"{"stream":"btcusdt@trade","data":{"e":"trade","E":1700000000100,"s":"BTCUSDT","t":12345,"p":"42000.50","q":"0.0017","T":1700000000099}}"#;
        let tick = parse_trade(frame).unwrap().unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.timestamp, 1700000000099);
        assert_eq!(tick.price, 42000.50);
        assert_eq!(tick.quantity, 0.0017);
    }

    #[test]
    fn non_trade_frames_are_skipped() {
        let ack = r#"{"result":null,"id":1}"#;
        assert!(parse_trade(ack).unwrap().is_none());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let frame = r#"{"data":{"T":1,"s":"BTCUSDT","p":"not-a-price","q":"1"}}"#;
        assert!(parse_trade(frame).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_trade("not json at all").is_err());
    }
}
