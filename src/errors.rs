//! Error types for the crash game engine
//!
//! Game rule violations are ordinary values returned to the caller; a failed
//! operation leaves engine state untouched.

use crate::games::Phase;
use thiserror::Error;

/// Root error type for crate-level operations (bootstrap, config, metrics)
#[derive(Debug, Error)]
pub enum CrashError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Game rule violations surfaced outside the API layer
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Socket and file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and validation errors
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

impl ConfigurationError {
    pub(crate) fn invalid(field: &str, value: impl ToString, reason: &str) -> Self {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Rejections produced by ledger, bet book and engine commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Player not found: {0}")]
    NotFound(String),

    #[error("Player already registered: {0}")]
    Duplicate(String),

    #[error("Insufficient funds: balance {balance:.2}, requested {requested:.2}")]
    InsufficientFunds { balance: f64, requested: f64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Operation not allowed while round is {0}")]
    InvalidPhase(Phase),

    #[error("No active bet for player {0}")]
    NoActiveBet(String),
}

impl GameError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::Duplicate(_) => "DUPLICATE",
            GameError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            GameError::InvalidAmount(_) => "INVALID_AMOUNT",
            GameError::InvalidPhase(_) => "INVALID_PHASE",
            GameError::NoActiveBet(_) => "NO_ACTIVE_BET",
        }
    }
}

// Convenience type alias for Results
pub type CrashResult<T> = Result<T, CrashError>;

/// Result alias for game commands
pub type GameResult<T> = Result<T, GameError>;
