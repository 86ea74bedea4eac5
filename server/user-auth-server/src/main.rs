use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use user_auth_server::{
    config::{AppConfig, DEFAULT_CONFIG_FILE},
    create_app,
    shutdown::shutdown_signal,
    AppState,
};

/// User auth engine HTTP server
#[derive(Parser, Debug)]
#[command(name = "user-auth-server")]
#[command(about = "JWT access/refresh token issuance and session management API")]
#[command(version)]
struct Args {
    /// Server bind address (overrides server.host)
    #[arg(long, env = "USER_AUTH_HOST")]
    host: Option<String>,

    /// Server port (overrides server.port)
    #[arg(short, long, env = "USER_AUTH_PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    if args.json_logs {
        config.logging.json = true;
    }

    logger_redacted::init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        "Starting user auth server"
    );

    let state = AppState::from_config(&config).await?;
    let app = create_app(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind to {bind_address}"))?;

    info!(%bind_address, "HTTP API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}
