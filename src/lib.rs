//! Crashgame - real-time crash multiplier round engine
//!
//! Players stake before a round launches, the multiplier climbs while the
//! round is flying, and every bet not cashed out before the crash is lost.
//! `GameEngine` serializes player commands against the periodic round tick;
//! `api` exposes it over HTTP and WebSocket.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod metrics;

pub use config::{ConfigLoader, GameConfig};
pub use errors::{ConfigurationError, CrashError, CrashResult, GameError, GameResult};
pub use games::{GameEngine, Phase, RoundEvent, RoundSnapshot};
