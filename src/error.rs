use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the seed and one-time code core.
///
/// Display strings never include seed, secret or key material.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid base64 ciphertext")]
    InvalidEncoding,
    #[error("private key unavailable")]
    KeyUnavailable,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("decrypted seed is not valid UTF-8")]
    InvalidSeedEncoding,
    #[error("decrypted seed has an invalid length")]
    InvalidSeedLength,
    #[error("seed is not valid hexadecimal")]
    InvalidHexSeed,
    #[error("seed not provisioned")]
    SeedNotProvisioned,
    #[error("invalid code format")]
    InvalidCodeFormat,
    #[error("seed storage failure")]
    Storage(#[source] std::io::Error),
}
