//! Soundpad server - main entry point
//!
//! Startup sequence:
//! 1. Parse arguments (CLI flags, falling back to environment variables)
//! 2. Load the TOML config file and resolve the server configuration
//! 3. Open the database and hydrate the live settings
//! 4. Build the playback controller and the dispatch table
//! 5. Serve WebSocket clients until a signal or client disconnect

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundpad_common::config::load_toml_config;
use soundpad_common::db::init_database;
use soundpad_server::audio::{AudioBackend, CpalBackend};
use soundpad_server::config::{ConfigOverrides, ServerConfig};
use soundpad_server::dispatch::build_dispatcher;
use soundpad_server::playback::PlaybackController;
use soundpad_server::server::{self, ServerState};
use soundpad_server::services::ConfigService;
use soundpad_server::{AppContext, LiveSettings};

/// Command-line arguments for soundpad-server
#[derive(Parser, Debug)]
#[command(name = "soundpad-server")]
#[command(about = "Local soundboard service: plays clips to speakers and a virtual microphone")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "SOUNDPAD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SOUNDPAD_PORT")]
    port: Option<u16>,

    /// Frames per playback chunk
    #[arg(long, env = "SOUNDPAD_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// SQLite database file
    #[arg(short, long, env = "SOUNDPAD_DATABASE")]
    database: Option<PathBuf>,

    /// Config file (default: <config dir>/soundpad/config.toml)
    #[arg(short, long, env = "SOUNDPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Case-insensitive fragment of the routed output device name
    #[arg(long, env = "SOUNDPAD_ROUTED_DEVICE")]
    routed_device: Option<String>,

    /// Audio host the routed device must belong to
    #[arg(long, env = "SOUNDPAD_ROUTED_HOST")]
    routed_host: Option<String>,

    /// Print the output device list and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            chunk_size: self.chunk_size,
            database_path: self.database.clone(),
            routed_device: self.routed_device.clone(),
            routed_host: self.routed_host.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "soundpad_server=debug,soundpad_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting soundpad-server {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let backend = Arc::new(CpalBackend::new());

    if args.list_devices {
        let devices = backend.output_devices().context("Failed to enumerate output devices")?;
        for device in devices {
            println!("{:>3}  [{}] {}", device.index, device.host, device.name);
        }
        return Ok(());
    }

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServerConfig::resolve(args.overrides(), &toml).context("Invalid configuration")?;
    info!(
        "Routed output: '{}' on {}, chunk size {} frames",
        config.routing.name_fragment, config.routing.host, config.chunk_size
    );

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let initial = ConfigService::hydrate(&pool)
        .await
        .context("Failed to load config record")?;
    let settings = Arc::new(LiveSettings::new(initial));

    let controller = Arc::new(PlaybackController::new(
        backend,
        Arc::clone(&settings),
        config.routing.clone(),
        config.chunk_size,
    ));

    let ctx = AppContext::new(pool.clone(), settings, Arc::clone(&controller));
    let dispatcher = build_dispatcher(&ctx).context("Failed to register event handlers")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr()))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    server::run(listener, ServerState::new(dispatcher, shutdown))
        .await
        .context("Server error")?;

    // Join any playing worker before the process exits
    let stopper = Arc::clone(&controller);
    if let Err(e) = tokio::task::spawn_blocking(move || stopper.stop()).await {
        error!("Failed to stop playback: {}", e);
    }
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
        _ = token.cancelled() => {}
    }

    token.cancel();
}
