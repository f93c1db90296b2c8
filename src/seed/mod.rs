//! Seed provisioning: the decrypted per-instance secret, how it is decrypted,
//! where the private key comes from and where the seed is kept between calls.

pub mod decrypt;
pub mod keys;
pub mod store;

pub use decrypt::decrypt_seed;
pub use keys::{KeyProvider, PemFileKeyProvider, PrivateKey, StaticKeyProvider};
pub use store::{FileSeedStore, MemorySeedStore, SeedStore};

use crate::error::Result;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::{info, instrument};

/// Number of characters in a decrypted seed.
pub const SEED_LENGTH: usize = 64;

/// The provisioned secret, a 64 character hex string.
///
/// `Debug` is redacted and the backing buffer is zeroized on drop.
#[derive(Clone)]
pub struct Seed(SecretString);

impl Seed {
    /// Wrap a value read back from a seed store. No validation happens here; the
    /// code engine rejects anything that is not hexadecimal.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        Self(SecretString::from(value.to_string()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// Decrypt `ciphertext_b64` with the key from `keys` and persist the seed.
///
/// Nothing is written unless decryption and validation both succeed, so a
/// failed attempt leaves the previously stored seed untouched.
///
/// # Errors
/// Returns `KeyUnavailable`, any decryption error from [`decrypt_seed`], or
/// `Storage` if the store rejects the write.
#[instrument(skip_all)]
pub fn provision(ciphertext_b64: &str, keys: &dyn KeyProvider, store: &dyn SeedStore) -> Result<()> {
    let private_key = keys.private_key()?;
    let seed = decrypt_seed(ciphertext_b64, &private_key)?;
    store.put(&seed)?;
    info!("Seed provisioned");
    Ok(())
}
