use crate::{
    error::{Error, Result},
    seed::{PrivateKey, SEED_LENGTH, Seed},
};
use base64ct::{Base64, Encoding};
use rsa::Oaep;
use secrecy::SecretString;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Decrypt a base64 RSA-OAEP ciphertext into a validated seed.
///
/// OAEP parameters are fixed: SHA-256 for both the hash and MGF1, empty label.
/// Either every check passes and a seed is returned, or nothing is.
///
/// # Errors
/// - `InvalidEncoding` if the trimmed input is empty or not standard base64.
/// - `DecryptionFailed` for any failure inside the RSA/OAEP step.
/// - `InvalidSeedEncoding` if the plaintext is not UTF-8.
/// - `InvalidSeedLength` if the plaintext is not exactly 64 characters.
/// - `InvalidHexSeed` if the plaintext contains a non-hex character.
pub fn decrypt_seed(ciphertext_b64: &str, private_key: &PrivateKey) -> Result<Seed> {
    let trimmed = ciphertext_b64.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidEncoding);
    }

    let ciphertext = Base64::decode_vec(trimmed).map_err(|_| Error::InvalidEncoding)?;

    // Collapse every RSA error into one variant so callers cannot tell padding
    // failures from key mismatches.
    let plaintext = Zeroizing::new(
        private_key
            .rsa()
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map_err(|_| Error::DecryptionFailed)?,
    );

    let text = std::str::from_utf8(&plaintext).map_err(|_| Error::InvalidSeedEncoding)?;

    if text.chars().count() != SEED_LENGTH {
        return Err(Error::InvalidSeedLength);
    }

    if !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHexSeed);
    }

    Ok(Seed(SecretString::from(text.to_string())))
}
