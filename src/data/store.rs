//! Durable tick and alert-rule storage over SQLite.
//!
//! Every operation is a single parameterized statement; no lock is held
//! across an await point. Ticks are append-only and never mutated.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::Result;

/// One trade, as received from the upstream feed.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
}

/// A stored alert rule, decoded once at the store boundary.
#[derive(Clone, Debug)]
pub struct AlertRule {
    pub id: i64,
    pub symbol_pair: String,
    pub metric: String,
    pub condition: String,
    pub value: f64,
    pub status: String,
    pub created_at: String,
}

impl AlertRule {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Cloneable handle to the shared SQLite database.
#[derive(Clone, Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn open(path: &str) -> Result<Self> {
        if let Some(dir) = Path::new(path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| crate::error::QuantStreamError::Config(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates tables and indexes if they do not exist yet.
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_ticks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                price REAL NOT NULL,
                quantity REAL NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_raw_ticks_timestamp_symbol
             ON raw_ticks (timestamp, symbol)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol_pair TEXT NOT NULL,
                metric TEXT NOT NULL,
                condition TEXT NOT NULL,
                value REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    // --- Tick operations ---

    /// Atomic single-row insert of one trade.
    pub fn append_tick(&self, tick: &Tick) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO raw_ticks (timestamp, symbol, price, quantity) VALUES (?1, ?2, ?3, ?4)",
            params![tick.timestamp, tick.symbol, tick.price, tick.quantity],
        )?;
        Ok(())
    }

    /// Most recent tick for a symbol, if any. Index-backed.
    pub fn latest_tick(&self, symbol: &str) -> Result<Option<Tick>> {
        let conn = self.conn.lock().unwrap();
        let tick = conn
            .query_row(
                "SELECT timestamp, symbol, price, quantity FROM raw_ticks
                 WHERE symbol = ?1 ORDER BY timestamp DESC, id DESC LIMIT 1",
                params![symbol],
                Self::decode_tick,
            )
            .optional()?;
        Ok(tick)
    }

    /// Up to `limit` most recent ticks across `symbols`, returned in
    /// chronological (ascending) order ready for resampling.
    pub fn recent_ticks(&self, symbols: &[&str], limit: usize) -> Result<Vec<Tick>> {
        let conn = self.conn.lock().unwrap();
        let placeholders = symbols
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT timestamp, symbol, price, quantity FROM raw_ticks
             WHERE symbol IN ({placeholders})
             ORDER BY timestamp DESC, id DESC LIMIT ?{}",
            symbols.len() + 1
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut values: Vec<&dyn rusqlite::ToSql> =
            symbols.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        let limit = limit as i64;
        values.push(&limit);
        let mut ticks = stmt
            .query_map(values.as_slice(), Self::decode_tick)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ticks.reverse();
        Ok(ticks)
    }

    fn decode_tick(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tick> {
        Ok(Tick {
            timestamp: row.get(0)?,
            symbol: row.get(1)?,
            price: row.get(2)?,
            quantity: row.get(3)?,
        })
    }

    // --- Alert rule operations ---

    /// A rule with the identical (pair, metric, condition, value) key,
    /// regardless of status.
    pub fn find_alert_by_key(
        &self,
        symbol_pair: &str,
        metric: &str,
        condition: &str,
        value: f64,
    ) -> Result<Option<AlertRule>> {
        let conn = self.conn.lock().unwrap();
        let rule = conn
            .query_row(
                "SELECT id, symbol_pair, metric, condition, value, status, created_at
                 FROM alerts
                 WHERE symbol_pair = ?1 AND metric = ?2 AND condition = ?3 AND value = ?4
                 LIMIT 1",
                params![symbol_pair, metric, condition, value],
                Self::decode_alert,
            )
            .optional()?;
        Ok(rule)
    }

    pub fn insert_alert(
        &self,
        symbol_pair: &str,
        metric: &str,
        condition: &str,
        value: f64,
    ) -> Result<AlertRule> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO alerts (symbol_pair, metric, condition, value) VALUES (?1, ?2, ?3, ?4)",
            params![symbol_pair, metric, condition, value],
        )?;
        let id = conn.last_insert_rowid();
        let rule = conn.query_row(
            "SELECT id, symbol_pair, metric, condition, value, status, created_at
             FROM alerts WHERE id = ?1",
            params![id],
            Self::decode_alert,
        )?;
        Ok(rule)
    }

    pub fn set_alert_status(&self, id: i64, status: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE alerts SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(())
    }

    /// Active rules, optionally filtered by symbol pair.
    pub fn active_alerts(&self, symbol_pair: Option<&str>) -> Result<Vec<AlertRule>> {
        let conn = self.conn.lock().unwrap();
        let mut rules = Vec::new();
        match symbol_pair {
            Some(pair) => {
                let mut stmt = conn.prepare(
                    "SELECT id, symbol_pair, metric, condition, value, status, created_at
                     FROM alerts WHERE status = 'active' AND symbol_pair = ?1 ORDER BY id",
                )?;
                for rule in stmt.query_map(params![pair], Self::decode_alert)? {
                    rules.push(rule?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, symbol_pair, metric, condition, value, status, created_at
                     FROM alerts WHERE status = 'active' ORDER BY id",
                )?;
                for rule in stmt.query_map([], Self::decode_alert)? {
                    rules.push(rule?);
                }
            }
        }
        Ok(rules)
    }

    /// Unconditional delete; a missing id is a no-op.
    pub fn delete_alert(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM alerts WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn decode_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRule> {
        Ok(AlertRule {
            id: row.get(0)?,
            symbol_pair: row.get(1)?,
            metric: row.get(2)?,
            condition: row.get(3)?,
            value: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
