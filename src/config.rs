//! Configuration management with validation and defaults
//!
//! `GameConfig` groups round timing, crash-point policy, ledger defaults and
//! API settings. `ConfigLoader` layers a TOML file and `CRASHGAME_*`
//! environment variables on top of the defaults.

use crate::errors::{ConfigurationError, CrashResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Complete engine and server configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub round: RoundConfig,
    pub crash: CrashPolicyConfig,
    pub ledger: LedgerConfig,
    pub api: ApiConfig,
}

/// Round phase timing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoundConfig {
    /// Time spent in WAITING before the round launches
    pub waiting_ms: u64,
    /// Time spent in CRASHED before the next round opens
    pub settle_ms: u64,
    /// Ticker period driving `GameEngine::advance`
    pub tick_ms: u64,
    /// Number of recent crash results kept for display
    pub history_capacity: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            waiting_ms: 10_000,
            settle_ms: 3_000,
            tick_ms: 50,
            history_capacity: 20,
        }
    }
}

/// Crash point distribution
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrashPolicyConfig {
    pub house_edge: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for CrashPolicyConfig {
    fn default() -> Self {
        Self {
            house_edge: 0.99,
            min_multiplier: 1.01,
            max_multiplier: 10.0,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub starting_balance: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000.0,
        }
    }
}

/// HTTP / WebSocket listener settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl GameConfig {
    /// Production timing: 10s betting window, 3s crash display
    pub fn production() -> Self {
        Self::default()
    }

    /// Short phases for tests and local simulation
    pub fn accelerated() -> Self {
        Self {
            round: RoundConfig {
                waiting_ms: 100,
                settle_ms: 50,
                ..RoundConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.round.waiting_ms == 0 {
            return Err(ConfigurationError::invalid("round.waiting_ms", 0, "must be > 0"));
        }
        if self.round.settle_ms == 0 {
            return Err(ConfigurationError::invalid("round.settle_ms", 0, "must be > 0"));
        }
        if self.round.tick_ms == 0 {
            return Err(ConfigurationError::invalid("round.tick_ms", 0, "must be > 0"));
        }
        if self.round.history_capacity == 0 {
            return Err(ConfigurationError::invalid(
                "round.history_capacity",
                0,
                "must be > 0",
            ));
        }

        let edge = self.crash.house_edge;
        if !(edge > 0.0 && edge <= 1.0) {
            return Err(ConfigurationError::invalid(
                "crash.house_edge",
                edge,
                "must be in (0, 1]",
            ));
        }
        if !self.crash.min_multiplier.is_finite() || self.crash.min_multiplier < 1.0 {
            return Err(ConfigurationError::invalid(
                "crash.min_multiplier",
                self.crash.min_multiplier,
                "must be >= 1.0",
            ));
        }
        if !self.crash.max_multiplier.is_finite()
            || self.crash.max_multiplier <= self.crash.min_multiplier
        {
            return Err(ConfigurationError::invalid(
                "crash.max_multiplier",
                self.crash.max_multiplier,
                "must be greater than crash.min_multiplier",
            ));
        }

        let balance = self.ledger.starting_balance;
        if !balance.is_finite() || balance < 0.0 {
            return Err(ConfigurationError::invalid(
                "ledger.starting_balance",
                balance,
                "must be a non-negative number",
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigurationError::invalid(
                "api.request_timeout_secs",
                0,
                "must be > 0",
            ));
        }

        Ok(())
    }

    pub fn waiting_duration(&self) -> Duration {
        Duration::from_millis(self.round.waiting_ms)
    }

    pub fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.round.settle_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.round.tick_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
    base: GameConfig,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Defaults used when no file is given (e.g. a profile)
    pub fn with_base(mut self, base: GameConfig) -> Self {
        self.base = base;
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> CrashResult<GameConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => self.base.clone(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<GameConfig, ConfigurationError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self, config: &GameConfig, path: &str) -> CrashResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into()
        })
    }
}

/// Apply `CRASHGAME_*` overrides read through `lookup`
fn apply_overrides<F>(config: &mut GameConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, ConfigurationError> {
        raw.trim()
            .parse()
            .map_err(|_| ConfigurationError::invalid(key, &raw, "could not parse value"))
    }

    if let Some(v) = lookup("CRASHGAME_WAITING_MS") {
        config.round.waiting_ms = parse("CRASHGAME_WAITING_MS", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_SETTLE_MS") {
        config.round.settle_ms = parse("CRASHGAME_SETTLE_MS", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_TICK_MS") {
        config.round.tick_ms = parse("CRASHGAME_TICK_MS", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_MAX_MULTIPLIER") {
        config.crash.max_multiplier = parse("CRASHGAME_MAX_MULTIPLIER", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_SEED") {
        config.crash.seed = Some(parse("CRASHGAME_SEED", v)?);
    }
    if let Some(v) = lookup("CRASHGAME_STARTING_BALANCE") {
        config.ledger.starting_balance = parse("CRASHGAME_STARTING_BALANCE", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_HOST") {
        config.api.host = v;
    }
    if let Some(v) = lookup("CRASHGAME_PORT") {
        config.api.port = parse("CRASHGAME_PORT", v)?;
    }
    if let Some(v) = lookup("CRASHGAME_ALLOWED_ORIGINS") {
        config.api.allowed_origins = v.split(',').map(|s| s.trim().to_string()).collect();
    }

    Ok(())
}
