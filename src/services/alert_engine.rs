//! Threshold alert rules over the live z-score.
//!
//! Rules live in the alerts table. Creation is idempotent on the rule
//! key; evaluation is the only path that flips a rule to `triggered`,
//! and a triggered rule stays silent until explicitly recreated.

use tracing::info;

use crate::data::store::{AlertRule, Database};
use crate::error::{QuantStreamError, Result};
use crate::events::TriggeredAlert;

pub const MIN_THRESHOLD: f64 = 0.5;
pub const MAX_THRESHOLD: f64 = 5.0;

#[derive(Clone, Debug)]
pub struct AlertEngine {
    db: Database,
}

impl AlertEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a rule, or reactivates the existing rule with the same
    /// (pair, metric, condition, threshold) key. Safe under retries.
    pub fn create(
        &self,
        symbol_pair: &str,
        metric: &str,
        condition: &str,
        value: f64,
    ) -> Result<AlertRule> {
        if metric != "z_score" {
            return Err(QuantStreamError::UnsupportedMetric {
                metric: metric.to_string(),
            });
        }
        if condition != "greater_than" && condition != "less_than" {
            return Err(QuantStreamError::UnsupportedCondition {
                condition: condition.to_string(),
            });
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&value) {
            return Err(QuantStreamError::ThresholdOutOfRange {
                value,
                min: MIN_THRESHOLD,
                max: MAX_THRESHOLD,
            });
        }

        if let Some(existing) = self.db.find_alert_by_key(symbol_pair, metric, condition, value)? {
            if !existing.is_active() {
                self.db.set_alert_status(existing.id, "active")?;
                info!("Reactivated alert rule {} for {}", existing.id, symbol_pair);
                return Ok(AlertRule {
                    status: "active".to_string(),
                    ..existing
                });
            }
            return Ok(existing);
        }

        let rule = self.db.insert_alert(symbol_pair, metric, condition, value)?;
        info!(
            "Created alert rule {}: {} {} {} {}",
            rule.id, symbol_pair, metric, condition, value
        );
        Ok(rule)
    }

    pub fn list(&self, symbol_pair: Option<&str>) -> Result<Vec<AlertRule>> {
        self.db.active_alerts(symbol_pair)
    }

    /// Unconditional delete; missing ids are a no-op.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.db.delete_alert(id)
    }

    /// Compares `z_score` against every active rule for the pair. Hits
    /// flip the rule to `triggered` and are returned for delivery; a
    /// triggered rule never fires again until recreated.
    pub fn evaluate(&self, symbol_pair: &str, z_score: f64) -> Result<Vec<TriggeredAlert>> {
        let mut fired = Vec::new();
        for rule in self.db.active_alerts(Some(symbol_pair))? {
            let hit = match rule.condition.as_str() {
                "greater_than" => z_score > rule.value,
                "less_than" => z_score < rule.value,
                _ => false,
            };
            if !hit {
                continue;
            }
            self.db.set_alert_status(rule.id, "triggered")?;
            let message = format!(
                "Alert: {} z-score {:.4} is {} threshold {}",
                symbol_pair,
                z_score,
                if rule.condition == "greater_than" { "above" } else { "below" },
                rule.value
            );
            info!("Alert rule {} triggered for {}", rule.id, symbol_pair);
            fired.push(TriggeredAlert {
                alert_id: rule.id,
                message,
                z_score,
            });
        }
        Ok(fired)
    }
}
