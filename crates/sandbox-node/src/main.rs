mod constants;
mod error;
mod routes;
mod sessions;

use std::net::SocketAddr;

use clap::Parser;
use sandbox_core::{constants::GENESIS_DATA, ChainConfig, Difficulty, TimestampMode};
use tracing::{info, Level};

use crate::{
    constants::{DEFAULT_LISTEN, DEFAULT_MAX_SESSIONS},
    routes::{router, AppState},
};

#[derive(Parser, Debug)]
#[command(name = "sandbox-node")]
#[command(about = "Serves chain sandbox sessions over HTTP")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Leading zeros required when a mine request omits `difficulty` (1-4)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(1..=4))]
    default_difficulty: i64,

    /// Whether block timestamps are committed into the hash (`committed` or `excluded`)
    #[arg(long, default_value_t = TimestampMode::Committed)]
    timestamp_mode: TimestampMode,

    /// Payload of every genesis block
    #[arg(long, default_value = GENESIS_DATA)]
    genesis_data: String,

    /// Upper bound on concurrently open sessions
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ChainConfig::default()
        .with_timestamp_mode(args.timestamp_mode)
        .with_genesis_data(args.genesis_data);
    let state = AppState::new(
        config,
        Difficulty::new(args.default_difficulty)?,
        args.max_sessions,
    );
    let app = router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!(
        timestamp_mode = %args.timestamp_mode,
        "sandbox-node listening on http://{addr}"
    );
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("sandbox-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
