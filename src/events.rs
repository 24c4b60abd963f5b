use serde::Serialize;

/// A rule hit produced by one evaluation pass.
#[derive(Clone, Debug)]
pub struct TriggeredAlert {
    pub alert_id: i64,
    pub message: String,
    pub z_score: f64,
}

/// Packets emitted to a live-data client. Alerts ride the same channel,
/// out of band with the regular updates.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum LivePacket {
    Update {
        /// ISO-8601 UTC timestamp of the Y-symbol tick.
        time: String,
        y_price: f64,
        x_price: f64,
        spread: f64,
        z_score: f64,
        regression_line_value: f64,
    },
    Alert {
        #[serde(rename = "type")]
        kind: &'static str,
        message: String,
        alert_id: i64,
    },
}

impl LivePacket {
    pub fn alert(message: String, alert_id: i64) -> Self {
        LivePacket::Alert {
            kind: "alert",
            message,
            alert_id,
        }
    }
}
