//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a missing file or section yields the
//! stock behaviour (1.5% band, one-hour wait, dry-run action). Secrets
//! (the price API key) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::engine::classifier::{Thresholds, DEFAULT_THRESHOLD_PCT};
use crate::types::MonitorError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub price_source: PriceSourceConfig,
    pub action: ActionConfig,
}

/// What the loop does once the stable delay has elapsed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StableReentry {
    /// Run the full price check again.
    #[default]
    ResumeMonitoring,
    /// Call the action routine's no-argument form once and stop checking.
    ActionOnly,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub threshold_pct: Decimal,
    pub stable_delay_secs: u64,
    pub stable_reentry: StableReentry,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            stable_delay_secs: 60 * 60,
            stable_reentry: StableReentry::default(),
        }
    }
}

impl MonitorConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::from_pct(self.threshold_pct)
    }

    pub fn stable_delay(&self) -> Duration {
        Duration::from_secs(self.stable_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PriceSourceConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub api_key_header: String,
    pub timeout_secs: u64,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key_env: "COINGECKO_API_KEY".to_string(),
            api_key_header: "x_cg_pro_api_key".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ActionConfig {
    /// Log instead of running the external routine.
    pub dry_run: bool,
    /// External program implementing the arbitrage routine.
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MonitorError> {
        let pct = self.monitor.threshold_pct;
        if pct <= Decimal::ZERO || pct >= Decimal::ONE_HUNDRED {
            return Err(MonitorError::Config(format!(
                "monitor.threshold_pct must be in (0, 100), got {pct}"
            )));
        }
        if self.price_source.base_url.is_empty() {
            return Err(MonitorError::Config("price_source.base_url is empty".into()));
        }
        if let Some(program) = &self.action.program {
            if program.trim().is_empty() {
                return Err(MonitorError::Config("action.program is empty".into()));
            }
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The price API key, if its env var is set and non-empty.
    pub fn price_api_key(&self) -> Option<SecretString> {
        Self::resolve_env(&self.price_source.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::new)
    }
}
