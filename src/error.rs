//! Custom error types for the analytics engine
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Top-level errors for the QuantStream core.
#[derive(Error, Debug)]
pub enum QuantStreamError {
    #[error("Symbol not supported: {symbol}")]
    UnsupportedSymbol { symbol: String },

    #[error("Base and hedge symbols cannot be the same: {symbol}")]
    IdenticalSymbols { symbol: String },

    #[error("Unsupported timeframe: {timeframe}")]
    UnsupportedTimeframe { timeframe: String },

    #[error("Alert threshold {value} out of range [{min}, {max}]")]
    ThresholdOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Unsupported alert metric: {metric}")]
    UnsupportedMetric { metric: String },

    #[error("Unsupported alert condition: {condition}")]
    UnsupportedCondition { condition: String },

    #[error("Rolling window must be at least 2, got {window}")]
    InvalidWindow { window: usize },

    #[error("Not enough aligned data: have {have}, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("Regression undefined: hedge series has zero variance")]
    UndefinedRegression,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuantStreamError {
    /// True when more history, not a retry, is the remedy.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            QuantStreamError::InsufficientData { .. } | QuantStreamError::UndefinedRegression
        )
    }

    /// True for request-shape faults rejected before any computation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QuantStreamError::UnsupportedSymbol { .. }
                | QuantStreamError::IdenticalSymbols { .. }
                | QuantStreamError::UnsupportedTimeframe { .. }
                | QuantStreamError::ThresholdOutOfRange { .. }
                | QuantStreamError::UnsupportedMetric { .. }
                | QuantStreamError::UnsupportedCondition { .. }
                | QuantStreamError::InvalidWindow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, QuantStreamError>;
