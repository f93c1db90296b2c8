use crate::{
    cli::globals::GlobalArgs,
    seed::{keys::write_key_pair, PrivateKey},
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub bits: usize,
    pub public_key: PathBuf,
}

/// Generate and write the key pair.
/// # Errors
/// Returns an error if key generation or writing either file fails.
pub async fn execute(args: Args) -> Result<()> {
    if args.globals.private_key.exists() {
        warn!(
            "Overwriting {}; seeds encrypted for the old key can no longer be decrypted",
            args.globals.private_key.display()
        );
    }

    info!("Generating {}-bit RSA key pair", args.bits);
    let bits = args.bits;
    let key = tokio::task::spawn_blocking(move || PrivateKey::generate(bits))
        .await
        .context("key generation task failed")??;

    write_key_pair(&key, &args.globals.private_key, &args.public_key)?;

    println!(
        "Wrote {} and {}",
        args.globals.private_key.display(),
        args.public_key.display()
    );
    Ok(())
}
