use crate::exchange::{ExchangeClient, SeedRequest};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub api_url: Url,
    pub student_id: String,
    pub repo_url: String,
    pub public_key: PathBuf,
    pub output: PathBuf,
}

/// Request the encrypted seed and save it.
/// # Errors
/// Returns an error if the public key cannot be read, the authority rejects the
/// request or the output file cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    let public_key = tokio::fs::read_to_string(&args.public_key)
        .await
        .with_context(|| {
            format!(
                "Failed to read {} (run `pki-totp keygen` first)",
                args.public_key.display()
            )
        })?;

    let client = ExchangeClient::new(args.api_url)?;
    let encrypted_seed = client
        .request_seed(&SeedRequest {
            student_id: args.student_id,
            github_repo_url: args.repo_url,
            public_key,
        })
        .await?;

    tokio::fs::write(&args.output, encrypted_seed.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Saved encrypted seed to {}", args.output.display());
    warn!("{} must not be committed to version control", args.output.display());
    Ok(())
}
