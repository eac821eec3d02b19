//! Seal a destination into a push identifier.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use push_relay::RelayPublicKey;
use push_types::PushDestination;

use crate::DestinationArgs;

/// Seal the destination and return the identifier bytes.
pub async fn identifier(args: &DestinationArgs) -> Result<Vec<u8>> {
    if args.package_id.is_empty() || args.token.is_empty() {
        anyhow::bail!("Package ID and device token must not be empty");
    }

    let pem = tokio::fs::read_to_string(&args.public_key)
        .await
        .with_context(|| format!("Failed to read {}", args.public_key.display()))?;
    let public_key = RelayPublicKey::from_pkcs1_pem(&pem)?;

    let destination =
        PushDestination::native(args.kind.into(), &args.package_id, &args.token)?;
    Ok(public_key.seal_destination(&destination)?)
}

/// Run the seal command, returning the identifier as base64.
pub async fn run(args: &DestinationArgs) -> Result<String> {
    Ok(STANDARD.encode(identifier(args).await?))
}
