//! zeropush binary entry point.
//!
//! Usage:
//! ```bash
//! zeropush server --config zeropush.toml
//! zeropush server --fcm-api-keys com.example.app:KEY --private-key-file relay.pem
//! zeropush --help
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeropush_relay::config::{Config, LogFormat};
use zeropush_relay::http::{build_router, health};
use zeropush_relay::logging::init_logging;
use zeropush_relay::PushRelay;

const DEFAULT_CONFIG_FILE: &str = "zeropush.toml";

/// Zero-knowledge push relay for APNs and FCM.
#[derive(Parser, Debug)]
#[command(name = "zeropush")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the push relay server
    Server(ServerArgs),
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Configuration file [default: zeropush.toml, skipped when absent]
    #[arg(long, short, env = "ZEROPUSH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "ZEROPUSH_BIND")]
    bind: Option<String>,

    /// PKCS#1 PEM private key used to open push identifiers
    #[arg(long, env = "ZEROPUSH_PRIVATE_KEY_FILE")]
    private_key_file: Option<PathBuf>,

    /// JSON key carrying the envelope in provider payloads
    #[arg(long, env = "ZEROPUSH_PUSH_JSON_KEY")]
    push_json_key: Option<String>,

    /// APNs PEM bundles (certificate + key)
    #[arg(long, env = "ZEROPUSH_APNS_CERTS", value_delimiter = ',')]
    apns_certs: Vec<PathBuf>,

    /// APNs PEM bundles forced onto the development gateway
    #[arg(long, env = "ZEROPUSH_APNS_DEV_VOIP_CERTS", value_delimiter = ',')]
    apns_dev_voip_certs: Vec<PathBuf>,

    /// FCM credentials as appID:apiKey
    #[arg(long, env = "ZEROPUSH_FCM_API_KEYS", value_delimiter = ',')]
    fcm_api_keys: Vec<String>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "ZEROPUSH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, env = "ZEROPUSH_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,
}

impl ServerArgs {
    /// Load the config file and apply command-line overrides on top.
    fn into_config(self) -> Result<Config> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(path) = self.private_key_file {
            config.server.private_key_file = path;
        }
        if let Some(key) = self.push_json_key {
            config.server.push_json_key = key;
        }
        if !self.apns_certs.is_empty() {
            config.apns.certs = self.apns_certs;
        }
        if !self.apns_dev_voip_certs.is_empty() {
            config.apns.dev_voip_certs = self.apns_dev_voip_certs;
        }
        if !self.fcm_api_keys.is_empty() {
            config.fcm.api_keys = self.fcm_api_keys;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load an explicit config file, or the default one when it exists.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                Ok(Config::from_file(default)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => serve(args.into_config()?).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    init_logging(&config.logging)?;
    health::init_start_time();

    let bind_address = config.server.bind_address.clone();
    let relay = Arc::new(PushRelay::build(config).context("failed to start relay")?);
    tracing::info!(
        "zeropush v{} starting with {} provider(s)",
        env!("CARGO_PKG_VERSION"),
        relay.manager().len()
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("Listening on {}", bind_address);

    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
