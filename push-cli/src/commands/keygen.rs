//! Generate the relay key pair.

use anyhow::{Context, Result};
use push_relay::RelayKey;
use std::path::Path;

/// File name of the private key.
pub const PRIVATE_KEY_FILE: &str = "relay.pem";
/// File name of the public key handed to senders.
pub const PUBLIC_KEY_FILE: &str = "relay.pub.pem";

/// Run the keygen command.
pub async fn run(out_dir: &Path, bits: usize) -> Result<()> {
    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);

    for path in [&private_path, &public_path] {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            anyhow::bail!(
                "{} already exists. Delete it to generate a new key.",
                path.display()
            );
        }
    }

    tokio::fs::create_dir_all(out_dir)
        .await
        .context("Failed to create output directory")?;

    println!("Generating {}-bit RSA key...", bits);
    let key = tokio::task::spawn_blocking(move || RelayKey::generate(bits))
        .await
        .context("Key generation task failed")??;

    tokio::fs::write(&private_path, key.to_pkcs1_pem()?)
        .await
        .context("Failed to write private key")?;
    set_file_permissions_0600(&private_path).await?;

    tokio::fs::write(&public_path, key.public_key().to_pkcs1_pem()?)
        .await
        .context("Failed to write public key")?;

    println!();
    println!("  Private key: {}", private_path.display());
    println!("  Public key:  {}", public_path.display());
    println!();
    println!("Point server.private_key_file at the private key and give the");
    println!("public key to whoever seals push identifiers.");

    Ok(())
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
