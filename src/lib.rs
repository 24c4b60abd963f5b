//! QuantStream - real-time pairs-trading analytics engine
//!
//! This library ingests a continuous trade-tick stream, persists it,
//! and serves historical and live statistical analytics for a chosen
//! pair of symbols, including threshold alerting on the live z-score.

pub mod analytics;
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod ingest;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use data::store::{Database, Tick};
pub use error::QuantStreamError;
pub use events::LivePacket;

#[cfg(test)]
mod config_tests;
