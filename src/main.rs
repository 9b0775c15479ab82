//! Crashgame server binary

use clap::{Parser, ValueEnum};
use crashgame::{api::ApiServer, ConfigLoader, CrashResult, GameConfig, GameEngine};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// 10s betting window, 3s crash display
    Production,
    /// 100ms / 50ms phases for local simulation
    Accelerated,
}

#[derive(Parser, Debug)]
#[command(name = "crashgame")]
#[command(about = "Real-time crash multiplier game server", long_about = None)]
struct Args {
    /// TOML configuration file (overrides the profile)
    #[arg(long)]
    config: Option<String>,

    /// Built-in timing profile used when no config file is given
    #[arg(long, value_enum, default_value = "production")]
    profile: Profile,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Fixed crash point seed
    #[arg(long)]
    seed: Option<u64>,

    /// Tracing filter directive
    #[arg(long, default_value = "crashgame=info,tower_http=info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> CrashResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter.clone().into()),
        )
        .init();

    let base = match args.profile {
        Profile::Production => GameConfig::production(),
        Profile::Accelerated => GameConfig::accelerated(),
    };
    let mut loader = ConfigLoader::new().with_base(base);
    if let Some(ref path) = args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if args.seed.is_some() {
        config.crash.seed = args.seed;
    }
    config.validate()?;

    info!("🚀 Starting crash game server ({:?} profile)", args.profile);
    let engine = Arc::new(GameEngine::new(&config)?);

    ApiServer::new(config, engine).run().await
}
