//! API Server
//!
//! Runs the round ticker next to the HTTP / WebSocket listener and stops both
//! on Ctrl+C or SIGTERM.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::{ApiConfig, GameConfig};
use crate::errors::{ConfigurationError, CrashResult};
use crate::games::{spawn_ticker, GameEngine};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{signal, sync::watch};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Build the application with its middleware stack
pub fn build_app(engine: Arc<GameEngine>, api: &ApiConfig) -> axum::Router {
    let state = Arc::new(AppState::new(engine));

    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(api.allowed_origins.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(api.request_timeout_secs)))
        // Tracing layer (last for complete request tracing)
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    config: GameConfig,
    engine: Arc<GameEngine>,
}

impl ApiServer {
    pub fn new(config: GameConfig, engine: Arc<GameEngine>) -> Self {
        Self { config, engine }
    }

    /// Start the ticker and serve until a shutdown signal arrives
    pub async fn run(self) -> CrashResult<()> {
        let addr = self.socket_addr()?;
        let app = build_app(self.engine.clone(), &self.config.api);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticker = spawn_ticker(self.engine.clone(), self.config.tick_interval(), shutdown_rx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🌐 Crash game server listening on http://{}", addr);
        self.log_server_info();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        let _ = shutdown_tx.send(true);
        if let Err(e) = ticker.await {
            warn!("Round ticker ended abnormally: {}", e);
        }

        served?;
        info!("🛑 Server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> CrashResult<SocketAddr> {
        let ip = self.config.api.host.parse::<std::net::IpAddr>().map_err(|_| {
            ConfigurationError::invalid("api.host", &self.config.api.host, "not an IP address")
        })?;
        Ok(SocketAddr::from((ip, self.config.api.port)))
    }

    fn log_server_info(&self) {
        let round = &self.config.round;
        let crash = &self.config.crash;
        info!("📋 Server Configuration:");
        info!("   Waiting: {}ms, settle: {}ms, tick: {}ms", round.waiting_ms, round.settle_ms, round.tick_ms);
        info!(
            "   Crash points: edge {:.2}, range {:.2}x..{:.2}x",
            crash.house_edge, crash.min_multiplier, crash.max_multiplier
        );
        info!("   Starting balance: {:.2}", self.config.ledger.starting_balance);
        info!("   CORS: {:?}", self.config.api.allowed_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
