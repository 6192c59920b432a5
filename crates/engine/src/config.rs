//! Economy tunables

use bazaar_core::{Error, Gold, Result, SkillValue};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All economy-wide knobs. Every field has a default so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyConfig {
    /// Apply the sentiment curve to prices and stock amounts
    #[serde(default = "default_true")]
    pub sentiment_pricing: bool,
    /// Purchases above this total may fall back to the reserve fund
    #[serde(default = "default_reserve_threshold")]
    pub reserve_threshold: Gold,
    /// Sale payments above this are issued as a bank check
    #[serde(default = "default_bank_check_threshold")]
    pub bank_check_threshold: Gold,
    /// Maximum distinct eligible lines per sale
    #[serde(default = "default_max_sell_lines")]
    pub max_sell_lines: usize,
    /// Maximum rows in a buy listing
    #[serde(default = "default_max_listing_rows")]
    pub max_listing_rows: usize,
    #[serde(default = "default_restock_delay_secs")]
    pub restock_delay_secs: i64,
    /// Hard ceiling for a stock entry's max quantity after doubling
    #[serde(default = "default_stock_ceiling")]
    pub stock_ceiling: u32,
    /// Half-quantity cap applied to entries at or above the ceiling
    #[serde(default = "default_large_stock_half")]
    pub large_stock_half: u32,
    /// Entries at or below this size never shrink
    #[serde(default = "default_small_stock_threshold")]
    pub small_stock_threshold: u32,
    /// Resale shelf lots older than this are discarded
    #[serde(default = "default_shelf_decay_secs")]
    pub shelf_decay_secs: i64,
    #[serde(default = "default_buy_back_multiplier")]
    pub buy_back_multiplier: f64,
    #[serde(default = "default_sell_price_divisor")]
    pub sell_price_divisor: f64,
    /// Sell bonus per barter point
    #[serde(default = "default_barter_rate")]
    pub barter_rate: f64,
    #[serde(default = "default_max_barter")]
    pub max_barter: u32,
    /// Barter floor granted to members of the vendor's affiliation
    #[serde(default = "default_guild_barter_cap")]
    pub guild_barter_cap: u32,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Skill training knobs (skill values in decimal points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    /// No skill can be trained past this value
    #[serde(default = "default_training_cap")]
    pub training_cap: f64,
    /// Skills at or above this value train at the advanced tier
    #[serde(default = "default_advanced_threshold")]
    pub advanced_threshold: f64,
    #[serde(default = "default_beginner_cost")]
    pub beginner_cost: Gold,
    #[serde(default = "default_advanced_cost")]
    pub advanced_cost: Gold,
    /// Points per skill per day at the advanced tier
    #[serde(default = "default_daily_advanced_cap")]
    pub daily_advanced_cap: f64,
    /// Maximum sum of all skills of an actor
    #[serde(default = "default_server_skill_cap")]
    pub server_skill_cap: f64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_true() -> bool { true }
fn default_reserve_threshold() -> Gold { Gold(100_000) }
fn default_bank_check_threshold() -> Gold { Gold(10_000) }
fn default_max_sell_lines() -> usize { 1000 }
fn default_max_listing_rows() -> usize { 250 }
fn default_restock_delay_secs() -> i64 { 2 * 60 * 60 }
fn default_stock_ceiling() -> u32 { 999 }
fn default_large_stock_half() -> u32 { 640 }
fn default_small_stock_threshold() -> u32 { 20 }
fn default_shelf_decay_secs() -> i64 { 2 * 60 * 60 }
fn default_buy_back_multiplier() -> f64 { 1.90 }
fn default_sell_price_divisor() -> f64 { 2.0 }
fn default_barter_rate() -> f64 { 0.03 }
fn default_max_barter() -> u32 { 100 }
fn default_guild_barter_cap() -> u32 { 100 }
fn default_training_cap() -> f64 { 70.0 }
fn default_advanced_threshold() -> f64 { 35.0 }
fn default_beginner_cost() -> Gold { Gold(10) }
fn default_advanced_cost() -> Gold { Gold(100) }
fn default_daily_advanced_cap() -> f64 { 5.0 }
fn default_server_skill_cap() -> f64 { 700.0 }
fn default_session_ttl_secs() -> i64 { 5 * 60 }
fn default_max_sessions() -> usize { 10_000 }

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            training_cap: default_training_cap(),
            advanced_threshold: default_advanced_threshold(),
            beginner_cost: default_beginner_cost(),
            advanced_cost: default_advanced_cost(),
            daily_advanced_cap: default_daily_advanced_cap(),
            server_skill_cap: default_server_skill_cap(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl TrainingConfig {
    pub fn training_cap(&self) -> SkillValue {
        SkillValue::from_points(self.training_cap)
    }

    pub fn advanced_threshold(&self) -> SkillValue {
        SkillValue::from_points(self.advanced_threshold)
    }

    pub fn daily_advanced_cap(&self) -> SkillValue {
        SkillValue::from_points(self.daily_advanced_cap)
    }

    pub fn server_skill_cap(&self) -> SkillValue {
        SkillValue::from_points(self.server_skill_cap)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            sentiment_pricing: true,
            reserve_threshold: default_reserve_threshold(),
            bank_check_threshold: default_bank_check_threshold(),
            max_sell_lines: default_max_sell_lines(),
            max_listing_rows: default_max_listing_rows(),
            restock_delay_secs: default_restock_delay_secs(),
            stock_ceiling: default_stock_ceiling(),
            large_stock_half: default_large_stock_half(),
            small_stock_threshold: default_small_stock_threshold(),
            shelf_decay_secs: default_shelf_decay_secs(),
            buy_back_multiplier: default_buy_back_multiplier(),
            sell_price_divisor: default_sell_price_divisor(),
            barter_rate: default_barter_rate(),
            max_barter: default_max_barter(),
            guild_barter_cap: default_guild_barter_cap(),
            training: TrainingConfig::default(),
        }
    }
}

impl EconomyConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EconomyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn restock_delay(&self) -> Duration {
        Duration::seconds(self.restock_delay_secs)
    }

    pub fn shelf_decay(&self) -> Duration {
        Duration::seconds(self.shelf_decay_secs)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let t = &self.training;

        if t.beginner_cost.is_zero() || t.advanced_cost.is_zero() {
            return Err(Error::InvalidConfig(
                "training costs must be positive".into(),
            ));
        }
        if t.advanced_threshold > t.training_cap {
            return Err(Error::InvalidConfig(format!(
                "advanced threshold {} is above the training cap {}",
                t.advanced_threshold, t.training_cap
            )));
        }
        if t.training_cap > t.server_skill_cap {
            return Err(Error::InvalidConfig(format!(
                "training cap {} is above the server skill cap {}",
                t.training_cap, t.server_skill_cap
            )));
        }
        if t.max_sessions == 0 || t.session_ttl_secs <= 0 {
            return Err(Error::InvalidConfig(
                "session store needs a capacity and a positive ttl".into(),
            ));
        }
        if self.sell_price_divisor <= 0.0 {
            return Err(Error::InvalidConfig(
                "sell price divisor must be positive".into(),
            ));
        }
        if self.large_stock_half > self.stock_ceiling
            || self.small_stock_threshold > self.stock_ceiling
        {
            return Err(Error::InvalidConfig(
                "stock thresholds must not exceed the stock ceiling".into(),
            ));
        }
        if self.restock_delay_secs < 0 || self.shelf_decay_secs < 0 {
            return Err(Error::InvalidConfig("delays must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EconomyConfig::from_json_str(r#"{"reserveThreshold":5000,"training":{"trainingCap":60.0}}"#)
                .unwrap();
        assert_eq!(config.reserve_threshold, Gold(5000));
        assert_eq!(config.bank_check_threshold, Gold(10_000));
        assert_eq!(config.training.training_cap().tenths(), 600);
        assert_eq!(config.training.advanced_cost, Gold(100));
    }

    #[test]
    fn test_validate_rejects_zero_training_cost() {
        let mut config = EconomyConfig::default();
        config.training.beginner_cost = Gold::ZERO;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EconomyConfig::default().validate().is_ok());
    }
}
