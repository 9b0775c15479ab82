//! Crash Game API Service
//!
//! HTTP commands and WebSocket round events over a shared `GameEngine`.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::{build_app, ApiServer};
