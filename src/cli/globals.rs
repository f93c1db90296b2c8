use crate::{
    cli::commands::storage::{ARG_PRIVATE_KEY, ARG_SEED_FILE},
    seed::{FileSeedStore, PemFileKeyProvider},
};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Locations every action works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub private_key: PathBuf,
    pub seed_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(private_key: impl Into<PathBuf>, seed_file: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            seed_file: seed_file.into(),
        }
    }

    /// # Errors
    /// Returns an error if a path argument is missing from the matches.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self> {
        let private_key = matches
            .get_one::<PathBuf>(ARG_PRIVATE_KEY)
            .cloned()
            .context("missing required argument: --private-key")?;
        let seed_file = matches
            .get_one::<PathBuf>(ARG_SEED_FILE)
            .cloned()
            .context("missing required argument: --seed-file")?;

        Ok(Self::new(private_key, seed_file))
    }

    #[must_use]
    pub fn key_provider(&self) -> PemFileKeyProvider {
        PemFileKeyProvider::new(&self.private_key)
    }

    #[must_use]
    pub fn seed_store(&self) -> FileSeedStore {
        FileSeedStore::new(&self.seed_file)
    }
}
