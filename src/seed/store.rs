use crate::{
    error::{Error, Result},
    seed::Seed,
};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tracing::{debug, instrument};

/// Single-value store holding the one active seed of this instance.
///
/// A `put` must be complete before any concurrent `get` can observe it; readers
/// see either the previous seed or the new one, never a partial write.
pub trait SeedStore: Send + Sync {
    /// # Errors
    /// Returns `Storage` if the seed cannot be persisted.
    fn put(&self, seed: &Seed) -> Result<()>;

    /// # Errors
    /// Returns `SeedNotProvisioned` if nothing has been stored yet, `Storage` on I/O failure.
    fn get(&self) -> Result<Seed>;
}

/// Seed kept in a plain text file.
///
/// Writes go to a uniquely named sibling temp file which is synced and then
/// renamed over the target, so readers never observe a truncated seed.
#[derive(Debug, Clone)]
pub struct FileSeedStore {
    path: PathBuf,
}

impl FileSeedStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "seed".into());
        name.push(format!(".{}.tmp", ulid::Ulid::new()));
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let result = options.open(&temp).and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        });

        if let Err(err) = result {
            let _ = fs::remove_file(&temp);
            return Err(err);
        }

        fs::rename(&temp, &self.path)?;
        self.sync_parent()
    }

    /// Flush the directory entry so the rename survives a crash.
    #[cfg(unix)]
    fn sync_parent(&self) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::File::open(parent)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SeedStore for FileSeedStore {
    #[instrument(skip(self, seed), fields(path = %self.path.display()))]
    fn put(&self, seed: &Seed) -> Result<()> {
        self.write_atomic(seed.expose().as_bytes())
            .map_err(Error::Storage)?;
        debug!("Seed persisted");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self) -> Result<Seed> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => zeroize::Zeroizing::new(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::SeedNotProvisioned);
            }
            Err(err) => return Err(Error::Storage(err)),
        };

        let value = contents.trim();
        if value.is_empty() {
            return Err(Error::SeedNotProvisioned);
        }

        Ok(Seed::from_stored(value))
    }
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySeedStore {
    slot: RwLock<Option<Seed>>,
}

impl MemorySeedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_seed(seed: Seed) -> Self {
        Self {
            slot: RwLock::new(Some(seed)),
        }
    }
}

impl SeedStore for MemorySeedStore {
    fn put(&self, seed: &Seed) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(seed.clone());
        Ok(())
    }

    fn get(&self) -> Result<Seed> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::SeedNotProvisioned)
    }
}
