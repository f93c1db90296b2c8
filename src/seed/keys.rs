use crate::error::{Error, Result};
use anyhow::{ensure, Context};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, instrument, warn};

/// Smallest modulus `keygen` accepts.
pub const MIN_KEY_BITS: usize = 2048;
pub const DEFAULT_KEY_BITS: usize = 4096;

/// RSA private key used only to unwrap the encrypted seed.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    /// Parse a PKCS#8 or PKCS#1 key, PEM or DER encoded.
    ///
    /// # Errors
    /// Returns `KeyUnavailable` if the bytes are not an unencrypted RSA private key.
    pub fn from_pem_or_der(pem_or_der: &[u8]) -> Result<Self> {
        if pem_or_der.starts_with(b"-----BEGIN") {
            let s = std::str::from_utf8(pem_or_der).map_err(|_| Error::KeyUnavailable)?;
            if let Ok(k) = RsaPrivateKey::from_pkcs8_pem(s) {
                return Ok(Self(k));
            }
            if let Ok(k) = RsaPrivateKey::from_pkcs1_pem(s) {
                return Ok(Self(k));
            }
            return Err(Error::KeyUnavailable);
        }

        if let Ok(k) = RsaPrivateKey::from_pkcs8_der(pem_or_der) {
            return Ok(Self(k));
        }
        if let Ok(k) = RsaPrivateKey::from_pkcs1_der(pem_or_der) {
            return Ok(Self(k));
        }
        Err(Error::KeyUnavailable)
    }

    /// Generate a fresh key with public exponent 65537.
    ///
    /// # Errors
    /// Returns an error if `bits` is below [`MIN_KEY_BITS`] or generation fails.
    pub fn generate(bits: usize) -> anyhow::Result<Self> {
        ensure!(
            bits >= MIN_KEY_BITS,
            "key size must be at least {MIN_KEY_BITS} bits, got {bits}"
        );
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, bits).context("Failed to generate RSA key")?;
        Ok(Self(key))
    }

    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from(&self.0)
    }

    /// Unencrypted PKCS#8 PEM, zeroized when dropped.
    ///
    /// # Errors
    /// Returns an error if the key cannot be encoded.
    pub fn to_pkcs8_pem(&self) -> anyhow::Result<zeroize::Zeroizing<String>> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .context("Failed to encode private key")
    }

    /// SubjectPublicKeyInfo PEM of the matching public key.
    ///
    /// # Errors
    /// Returns an error if the key cannot be encoded.
    pub fn public_key_pem(&self) -> anyhow::Result<String> {
        self.public_key()
            .to_public_key_pem(LineEnding::LF)
            .context("Failed to encode public key")
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Capability that hands out the decryption key.
pub trait KeyProvider: Send + Sync {
    /// # Errors
    /// Returns `KeyUnavailable` if the key cannot be located or parsed.
    fn private_key(&self) -> Result<PrivateKey>;
}

/// Reads the key from a PEM file on every call, so a replaced key file is
/// picked up without a restart.
#[derive(Debug, Clone)]
pub struct PemFileKeyProvider {
    path: PathBuf,
}

impl PemFileKeyProvider {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyProvider for PemFileKeyProvider {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn private_key(&self) -> Result<PrivateKey> {
        let bytes = fs::read(&self.path).map_err(|err| {
            warn!("Could not read private key: {}", err.kind());
            Error::KeyUnavailable
        })?;
        let bytes = zeroize::Zeroizing::new(bytes);

        let key = PrivateKey::from_pem_or_der(&bytes)?;
        debug!("Private key loaded");
        Ok(key)
    }
}

/// Key already held in memory.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider(Arc<PrivateKey>);

impl StaticKeyProvider {
    #[must_use]
    pub fn new(key: PrivateKey) -> Self {
        Self(Arc::new(key))
    }
}

impl KeyProvider for StaticKeyProvider {
    fn private_key(&self) -> Result<PrivateKey> {
        Ok(self.0.as_ref().clone())
    }
}

/// Write a key pair to disk, the private half with owner-only permissions.
///
/// # Errors
/// Returns an error if either file cannot be written.
pub fn write_key_pair(
    key: &PrivateKey,
    private_path: &Path,
    public_path: &Path,
) -> anyhow::Result<()> {
    let private_pem = key.to_pkcs8_pem()?;
    let public_pem = key.public_key_pem()?;

    write_private(private_path, private_pem.as_bytes())
        .with_context(|| format!("Failed to write {}", private_path.display()))?;
    fs::write(public_path, public_pem.as_bytes())
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    Ok(())
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
