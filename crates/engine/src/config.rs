//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidVariable { name: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Tunables of the settlement engine.
///
/// Every replica must run with the same configuration; it participates in
/// consensus just like the request stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum pool hops explored by the route finder.
    pub max_hops: usize,
    /// Granularity, in percent, of AMM/order-book split candidates.
    pub split_step_percent: u32,
    /// Roll back every leg of a hybrid trade when a later leg fails.
    pub atomic_trades: bool,
    /// Fee tiers (basis points) a pool may be created with.
    pub allowed_fee_tiers: Vec<u32>,
    /// Slippage bound applied to market legs that carry none.
    pub default_max_slippage_bps: u32,
    /// Number of alternative routes returned by route queries.
    pub max_route_alternatives: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hops: 3,
            split_step_percent: 10,
            atomic_trades: true,
            allowed_fee_tiers: vec![1, 5, 30, 100],
            default_max_slippage_bps: 100, // 1%
            max_route_alternatives: 5,
        }
    }
}

impl EngineConfig {
    /// Creates a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum route length.
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Sets the split granularity.
    #[must_use]
    pub fn with_split_step_percent(mut self, step: u32) -> Self {
        self.split_step_percent = step;
        self
    }

    /// Sets multi-leg atomicity.
    #[must_use]
    pub fn with_atomic_trades(mut self, atomic: bool) -> Self {
        self.atomic_trades = atomic;
        self
    }

    /// Sets the allowed fee tiers.
    #[must_use]
    pub fn with_allowed_fee_tiers(mut self, tiers: Vec<u32>) -> Self {
        self.allowed_fee_tiers = tiers;
        self
    }

    /// Sets the default slippage bound for unbounded market legs.
    #[must_use]
    pub fn with_default_max_slippage_bps(mut self, bps: u32) -> Self {
        self.default_max_slippage_bps = bps;
        self
    }

    /// Loads overrides from `HYBRID_DEX_*` environment variables on top of
    /// the defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unparsable values or an invalid result.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = read_var("HYBRID_DEX_MAX_HOPS")? {
            config.max_hops = v;
        }
        if let Some(v) = read_var("HYBRID_DEX_SPLIT_STEP_PERCENT")? {
            config.split_step_percent = v;
        }
        if let Some(v) = read_var("HYBRID_DEX_ATOMIC_TRADES")? {
            config.atomic_trades = v;
        }
        if let Some(v) = read_var("HYBRID_DEX_DEFAULT_MAX_SLIPPAGE_BPS")? {
            config.default_max_slippage_bps = v;
        }
        if let Ok(raw) = env::var("HYBRID_DEX_FEE_TIERS") {
            config.allowed_fee_tiers = raw
                .split(',')
                .map(|t| t.trim().parse::<u32>())
                .collect::<Result<_, _>>()
                .map_err(|_| ConfigError::InvalidVariable {
                    name: "HYBRID_DEX_FEE_TIERS",
                    value: raw.clone(),
                })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError::Invalid`] for out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hops == 0 {
            return Err(ConfigError::Invalid("max_hops must be at least 1"));
        }
        if self.split_step_percent == 0 || self.split_step_percent > 100 {
            return Err(ConfigError::Invalid("split_step_percent must be in 1..=100"));
        }
        if self.allowed_fee_tiers.iter().any(|t| *t >= 10_000) {
            return Err(ConfigError::Invalid("fee tiers must be below 10000 bps"));
        }
        if self.default_max_slippage_bps > 10_000 {
            return Err(ConfigError::Invalid("default slippage must be at most 10000 bps"));
        }
        Ok(())
    }
}

fn read_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVariable { name, value }),
        Err(_) => Ok(None),
    }
}
