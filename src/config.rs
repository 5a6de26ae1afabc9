//! Rule configuration.
//!
//! Every tunable constant lives in `RulesConfig` and is handed explicitly to
//! the code that needs it. Missing JSON fields fall back to the defaults, so
//! an override file only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::PricingConfig;
use crate::resolve::combat::CombatConfig;
use crate::resolve::diplomacy::DiplomacyConfig;
use crate::resolve::economy::EconomyConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rules: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub pricing: PricingConfig,
    pub combat: CombatConfig,
    pub economy: EconomyConfig,
    pub diplomacy: DiplomacyConfig,
}

impl RulesConfig {
    /// Parses a JSON override document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: RulesConfig = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reads a JSON override file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Rejects values that would break the engine's arithmetic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pricing;
        if !(p.penalty_per_missing >= 0.0 && p.penalty_cap >= 1.0) {
            return Err(ConfigError::Invalid(
                "penalty_per_missing must be >= 0 and penalty_cap >= 1".into(),
            ));
        }
        let c = &self.combat;
        let probabilities = [c.min_win_probability, c.max_win_probability];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(ConfigError::Invalid("win probabilities must be within 0..=1".into()));
        }
        let fractions = [c.winner_loss_min, c.winner_loss_max, c.loser_loss_min, c.loser_loss_max];
        if fractions.iter().any(|f| !(0.0..=1.0).contains(f)) {
            return Err(ConfigError::Invalid("loss fractions must be within 0..=1".into()));
        }
        if !(c.home_advantage > 0.0 && c.strength_per_unit >= 0.0) {
            return Err(ConfigError::Invalid(
                "home_advantage must be > 0 and strength_per_unit >= 0".into(),
            ));
        }
        Ok(())
    }
}
