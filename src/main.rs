//! Main entry point for the Green Room matchmaking service
//!
//! This is the production entry point that initializes and runs the room
//! API together with the health/metrics server, with proper error
//! handling, logging, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use green_room::config::AppConfig;
use green_room::metrics::{HealthServer, HealthServerConfig, MetricsCollector, MetricsService};
use green_room::results::ResultAggregator;
use green_room::room::RoomEngine;
use green_room::service::{self, ApiContext};
use green_room::store::InMemoryRoomStore;
use green_room::user::UserDirectory;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Green Room Matchmaking Service - rhythm-game room lifecycle backend
#[derive(Parser)]
#[command(
    name = "green-room",
    version,
    about = "A matchmaking microservice for rhythm-game play rooms",
    long_about = "Green Room is a Rust-based matchmaking microservice that manages \
                 short-lived play rooms for a rhythm game: creation, bounded-capacity \
                 joining, ownership transfer, game start/finish, and per-member result \
                 aggregation."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override room API port")]
    http_port: Option<u16>,

    /// Metrics port override
    #[arg(long, value_name = "PORT", help = "Override metrics server port")]
    metrics_port: Option<u16>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Periodically refresh gauges and uptime from engine statistics
async fn stats_update_task(engine: RoomEngine, metrics: Arc<MetricsCollector>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    let start_time = tokio::time::Instant::now();

    loop {
        interval.tick().await;

        metrics
            .service()
            .uptime_seconds
            .set(start_time.elapsed().as_secs() as i64);

        match engine.get_stats() {
            Ok(stats) => {
                debug!(
                    "Updating metrics - waiting rooms: {}, games started: {}",
                    stats.waiting_rooms, stats.games_started
                );
                metrics.update_from_engine_stats(&stats);
                metrics.update_health_status(2); // healthy
            }
            Err(e) => {
                warn!("Failed to get engine stats for metrics update: {}", e);
                metrics.update_health_status(0); // unhealthy
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Green Room Matchmaking Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   API port: {}", config.service.http_port);
    info!("   Metrics port: {}", config.service.metrics_port);
    info!(
        "   Token attempts: {}",
        config.directory.token_attempts
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(metrics_port) = args.metrics_port {
        config.service.metrics_port = metrics_port;
    }

    green_room::config::validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Core components share one store
    info!("Initializing service components...");
    let store = Arc::new(InMemoryRoomStore::new());
    let metrics = Arc::new(MetricsCollector::new()?);

    let directory = Arc::new(UserDirectory::with_token_attempts(
        store.clone(),
        config.directory.token_attempts,
    ));
    let engine = RoomEngine::with_metrics(store.clone(), metrics.clone());
    let results = Arc::new(ResultAggregator::new(store.clone()));

    let context = ApiContext {
        directory,
        engine: engine.clone(),
        results,
        metrics: metrics.clone(),
    };

    // Health and metrics endpoints on their own port
    let health_config = HealthServerConfig {
        port: config.service.metrics_port,
        host: "0.0.0.0".to_string(),
    };
    let health_server =
        Arc::new(HealthServer::new(health_config, metrics.clone()).with_engine(engine.clone()));
    let metrics_service = Arc::new(MetricsService::new(metrics.clone(), health_server));

    let metrics_task = {
        let metrics_service = metrics_service.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            }
        })
    };

    let stats_task = tokio::spawn(stats_update_task(engine.clone(), metrics.clone()));

    info!("Green Room Matchmaking Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    // The API server owns the main task until a shutdown signal arrives
    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.service.http_port));
    if let Err(e) = service::serve(context, api_addr, wait_for_shutdown_signal()).await {
        error!("API server error: {}", e);
    }

    info!("Shutdown signal received, beginning graceful shutdown...");

    stats_task.abort();

    let shutdown = async {
        if let Err(e) = metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        }
        let _ = metrics_task.await;
    };

    match tokio::time::timeout(config.shutdown_timeout(), shutdown).await {
        Ok(()) => {
            info!("Graceful shutdown completed successfully");
        }
        Err(_) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    // Final statistics for the log
    if let Ok(stats) = engine.get_stats() {
        info!("Final service statistics: {:?}", stats);
    }

    info!("Green Room Matchmaking Service stopped");
    Ok(())
}
