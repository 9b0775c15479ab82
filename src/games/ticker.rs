//! Periodic round driver
//!
//! Calls `GameEngine::advance` on a fixed interval and publishes a state
//! snapshot after every tick until the shutdown flag flips.

use crate::games::engine::GameEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

pub fn spawn_ticker(
    engine: Arc<GameEngine>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("⏱️  Round ticker started ({}ms period)", period.as_millis());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    engine.advance();
                    engine.publish_state();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("🛑 Round ticker stopped");
    })
}
