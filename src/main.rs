//! drive-report - Document classification API for Google Drive
//!
//! An HTTP service that lists documents awaiting classification, reports
//! classification progress and renders category/confidence reports from
//! the properties written by an external classifier.
//!
//! Exit codes:
//!   0 - Clean shutdown
//!   1 - Startup error (arguments, config, credentials, bind failure)

mod analysis;
mod api;
mod cli;
mod config;
mod drive;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use drive::{Credentials, DriveClient, DriveClientConfig};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("drive-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_server(args).await {
        error!("Server failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default drive-report.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set supported MIME types, page limits and the token path.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration, connect to Drive and serve until shutdown.
async fn run_server(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.apply_env();
    config.merge_with_args(&args);
    config.validate()?;

    info!(
        "Supported MIME types: {}",
        if config.drive.supported_mime_types.is_empty() {
            "(any)".to_string()
        } else {
            config.drive.supported_mime_types.join(", ")
        }
    );
    info!(
        "Max page size: {} | Cache duration: {} days | Processor: {}",
        config.drive.max_results_per_page,
        config.classification.cache_duration_days,
        config
            .classification
            .processor_url
            .as_deref()
            .unwrap_or("(not set)")
    );

    // Credentials are checked before anything is served
    let credentials = Credentials::load(&config.drive.token_path)
        .context("Failed to load Google Drive credentials")?;
    debug!("Loaded credentials: {:?}", credentials);

    let client = DriveClient::new(
        DriveClientConfig {
            api_base: config.drive.api_base.clone(),
            timeout_seconds: config.drive.timeout_seconds,
        },
        credentials,
    )?;

    let addr = config.bind_address();
    let app = api::router(api::AppState::new(Arc::new(client), config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
