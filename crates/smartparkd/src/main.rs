//! smartparkd — the SmartPark daemon.
//!
//! Single binary that assembles the parking lot backend:
//! - State store (redb, on disk or in memory)
//! - Parking service (park, exit, billing, admin)
//! - REST API
//!
//! It also runs the suggestion engine offline over a snapshot file.
//!
//! # Usage
//!
//! ```text
//! smartparkd serve --port 8080 --data-dir /var/lib/smartpark
//! smartparkd suggest --vehicle-type CAR --slots slots.json
//! smartparkd config init --path smartpark.toml
//! ```

mod commands;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use smartpark_service::{ParkingService, SmartparkConfig};
use smartpark_state::StateStore;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "smartparkd", about = "SmartPark parking lot daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve {
        /// Path to smartpark.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state. In-memory when omitted.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Suggest a slot for a vehicle from a JSON snapshot of the lot.
    Suggest {
        /// Vehicle type: CAR, BIKE, MICROBUS or TRUCK.
        #[arg(long)]
        vehicle_type: String,

        /// JSON file holding an array of `{slotNumber, occupied, ...}`.
        #[arg(long)]
        slots: PathBuf,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Configuration file helpers.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a smartpark.toml with every default spelled out.
    Init {
        #[arg(short, long, default_value = "smartpark.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,smartparkd=debug,smartpark=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
        } => {
            let mut config = match config {
                Some(path) => SmartparkConfig::from_file(&path)?,
                None => SmartparkConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if data_dir.is_some() {
                config.server.data_dir = data_dir;
            }
            run_server(config).await
        }
        Command::Suggest {
            vehicle_type,
            slots,
            format,
        } => commands::suggest(&vehicle_type, &slots, &format),
        Command::Config { action } => match action {
            ConfigAction::Init { path } => commands::config_init(&path),
        },
    }
}

async fn run_server(config: SmartparkConfig) -> anyhow::Result<()> {
    info!("SmartPark daemon starting");

    // ── State store ────────────────────────────────────────────

    let store = match &config.server.data_dir {
        Some(data_dir) => {
            std::fs::create_dir_all(data_dir)?;
            let db_path = data_dir.join("smartpark.redb");
            let store = StateStore::open(&db_path)?;
            info!(path = ?db_path, "state store opened");
            store
        }
        None => {
            warn!("no data directory configured, state is kept in memory");
            StateStore::open_in_memory()?
        }
    };

    // ── Parking service ────────────────────────────────────────

    let service = ParkingService::new(store, config.lot.clone());
    service.seed_defaults(&config).await?;
    info!(
        slots = service.store().list_slots()?.len(),
        floors = service.store().list_floors()?.len(),
        "parking service initialized"
    );

    // ── API server ─────────────────────────────────────────────

    let router = smartpark_api::build_router(Arc::new(service));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("SmartPark daemon stopped");
    Ok(())
}
