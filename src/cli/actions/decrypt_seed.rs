use crate::{cli::globals::GlobalArgs, seed};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub input: PathBuf,
}

/// Decrypt the ciphertext file and store the seed.
/// # Errors
/// Returns an error if the input cannot be read, decryption fails or the seed
/// cannot be stored.
pub async fn execute(args: Args) -> Result<()> {
    let ciphertext = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    seed::provision(
        &ciphertext,
        &args.globals.key_provider(),
        &args.globals.seed_store(),
    )
    .context("Decryption failed")?;

    println!("Seed stored in {}", args.globals.seed_file.display());
    Ok(())
}
