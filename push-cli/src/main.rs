//! # zeropush-cli
//!
//! CLI tool for operating and testing a zeropush relay.
//!
//! ## Commands
//!
//! - `keygen`: Generate the relay key pair
//! - `seal`: Seal a device destination into a push identifier
//! - `send`: Send a test push through a running relay
//!
//! ## Example
//!
//! ```bash
//! # Generate relay.pem and relay.pub.pem
//! zeropush-cli keygen --out-dir /etc/zeropush
//!
//! # Seal a destination the relay can open
//! ID=$(zeropush-cli seal --public-key relay.pub.pem --kind fcm \
//!     --package-id com.example.app --token DEVICE_TOKEN)
//!
//! # Push an envelope through the relay
//! zeropush-cli send --relay http://localhost:1337 --identifier "$ID" --message hello
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use push_types::DevicePushType;
use std::path::PathBuf;

mod commands;

use commands::{keygen, seal, send};

/// CLI tool for operating and testing a zeropush relay.
#[derive(Parser, Debug)]
#[command(name = "zeropush-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a relay key pair
    Keygen {
        /// Directory to write relay.pem and relay.pub.pem into
        #[arg(long, short, default_value = ".")]
        out_dir: PathBuf,

        /// RSA modulus size
        #[arg(long, default_value_t = push_relay::keys::DEFAULT_KEY_BITS)]
        bits: usize,
    },

    /// Seal a destination and print the base64 push identifier
    Seal(DestinationArgs),

    /// Send a push through a relay
    Send {
        /// Relay base URL
        #[arg(long, env = "ZEROPUSH_RELAY", default_value = "http://localhost:1337")]
        relay: String,

        /// Base64 sealed identifier, as printed by `seal`
        #[arg(long)]
        identifier: String,

        /// Envelope to deliver (or use --file)
        #[arg(long, short)]
        message: Option<String>,

        /// File whose bytes are the envelope
        #[arg(long, short, conflicts_with = "message")]
        file: Option<PathBuf>,

        /// Request high priority delivery
        #[arg(long)]
        high_priority: bool,
    },
}

/// Where a push should go.
#[derive(Args, Debug, Clone)]
pub struct DestinationArgs {
    /// Relay public key (PKCS#1 PEM)
    #[arg(long, default_value = "relay.pub.pem")]
    pub public_key: PathBuf,

    /// Push provider of the device
    #[arg(long, value_enum)]
    pub kind: Kind,

    /// Bundle ID (APNs) or app ID (FCM)
    #[arg(long)]
    pub package_id: String,

    /// Device token
    #[arg(long)]
    pub token: String,
}

/// Provider family selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Apple Push Notification service
    Apns,
    /// Firebase Cloud Messaging
    Fcm,
}

impl From<Kind> for DevicePushType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Apns => DevicePushType::Apns,
            Kind::Fcm => DevicePushType::Fcm,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { out_dir, bits } => {
            keygen::run(&out_dir, bits).await?;
        }
        Commands::Seal(destination) => {
            println!("{}", seal::run(&destination).await?);
        }
        Commands::Send {
            relay,
            identifier,
            message,
            file,
            high_priority,
        } => {
            let envelope = if let Some(msg) = message {
                msg.into_bytes()
            } else if let Some(path) = file {
                tokio::fs::read(&path)
                    .await
                    .context("Failed to read file")?
            } else {
                anyhow::bail!("Must specify --message or --file");
            };
            send::run(&relay, &identifier, envelope, high_priority).await?;
        }
    }

    Ok(())
}
