//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section is optional; anything left out falls back to the built-in
//! optimizer and payout tables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::optimizer::OptimizerConfig;
use crate::payout::PayoutConfig;
use crate::sanitize::{DEFAULT_BUDGET, MAX_BUDGET, MIN_BUDGET};
use crate::types::{BetFamily, ToteError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: RequestDefaults,
    pub optimizer: OptimizerSection,
    pub payout: PayoutSection,
}

/// Values used when a request leaves them out.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RequestDefaults {
    pub budget: f64,
    pub field_size: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            field_size: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OptimizerSection {
    pub max_box_size: Option<usize>,
    /// Keyed by family name: "exacta", "trifecta", "superfecta".
    pub stake_caps: HashMap<String, f64>,
    pub payout_multipliers: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PayoutSection {
    pub takeout: HashMap<String, f64>,
    pub multipliers: HashMap<String, f64>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ToteError> {
        let budget = self.defaults.budget;
        if !budget.is_finite() || !(MIN_BUDGET..=MAX_BUDGET).contains(&budget) {
            return Err(ToteError::Config(format!(
                "defaults.budget must be between {MIN_BUDGET} and {MAX_BUDGET}, got {budget}"
            )));
        }
        if self.optimizer.max_box_size == Some(0) {
            return Err(ToteError::Config("optimizer.max_box_size must be at least 1".into()));
        }
        for (section, table) in [
            ("optimizer.stake_caps", &self.optimizer.stake_caps),
            ("optimizer.payout_multipliers", &self.optimizer.payout_multipliers),
            ("payout.takeout", &self.payout.takeout),
            ("payout.multipliers", &self.payout.multipliers),
        ] {
            for (key, value) in table {
                key.parse::<BetFamily>()
                    .map_err(|_| ToteError::Config(format!("{section}: unknown bet family '{key}'")))?;
                if !value.is_finite() || *value < 0.0 {
                    return Err(ToteError::Config(format!("{section}.{key} must be a non-negative number")));
                }
            }
        }
        if let Some((key, value)) = self.payout.takeout.iter().find(|(_, v)| **v >= 1.0) {
            return Err(ToteError::Config(format!("payout.takeout.{key} must be below 1.0, got {value}")));
        }
        Ok(())
    }

    /// Optimizer tunables with config overrides applied.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        let d = OptimizerConfig::default();
        let caps = &self.optimizer.stake_caps;
        let mult = &self.optimizer.payout_multipliers;
        OptimizerConfig {
            max_box_size: self.optimizer.max_box_size.unwrap_or(d.max_box_size),
            exacta_stake_cap: lookup(caps, BetFamily::Exacta, d.exacta_stake_cap),
            trifecta_stake_cap: lookup(caps, BetFamily::Trifecta, d.trifecta_stake_cap),
            superfecta_stake_cap: lookup(caps, BetFamily::Superfecta, d.superfecta_stake_cap),
            exacta_payout_multiplier: lookup(mult, BetFamily::Exacta, d.exacta_payout_multiplier),
            trifecta_payout_multiplier: lookup(mult, BetFamily::Trifecta, d.trifecta_payout_multiplier),
            superfecta_payout_multiplier: lookup(mult, BetFamily::Superfecta, d.superfecta_payout_multiplier),
        }
    }

    /// Payout tables with config overrides applied.
    pub fn payout_config(&self) -> PayoutConfig {
        let d = PayoutConfig::default();
        let takeout = &self.payout.takeout;
        let mult = &self.payout.multipliers;
        PayoutConfig {
            exacta_takeout: lookup(takeout, BetFamily::Exacta, d.exacta_takeout),
            trifecta_takeout: lookup(takeout, BetFamily::Trifecta, d.trifecta_takeout),
            superfecta_takeout: lookup(takeout, BetFamily::Superfecta, d.superfecta_takeout),
            exacta_multiplier: lookup(mult, BetFamily::Exacta, d.exacta_multiplier),
            trifecta_multiplier: lookup(mult, BetFamily::Trifecta, d.trifecta_multiplier),
            superfecta_multiplier: lookup(mult, BetFamily::Superfecta, d.superfecta_multiplier),
        }
    }
}

/// Find a per-family value, accepting any spelling `BetFamily` parses.
fn lookup(table: &HashMap<String, f64>, family: BetFamily, default: f64) -> f64 {
    table
        .iter()
        .find(|(k, _)| k.parse::<BetFamily>().ok() == Some(family))
        .map(|(_, v)| *v)
        .unwrap_or(default)
}
