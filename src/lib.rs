//! # pki-totp (Seed Provisioning & Second Factor)
//!
//! `pki-totp` provisions a per-instance secret ("seed") that arrives encrypted
//! under this instance's RSA public key, stores it locally and derives time-based
//! one-time codes from it.
//!
//! ## Seed lifecycle
//!
//! 1. **Key pair:** `pki-totp keygen` writes an RSA key pair. The public half is
//!    sent to the provisioning authority (`pki-totp request-seed`).
//! 2. **Decryption:** the authority answers with a base64 RSA-OAEP ciphertext
//!    (SHA-256 hash and MGF1, empty label). [`seed::decrypt_seed`] turns it into a
//!    64 character hex seed, or fails without producing anything.
//! 3. **Persistence:** the seed is written through a [`seed::SeedStore`]. The file
//!    store replaces the seed atomically (temp file + rename), so concurrent
//!    readers never see a partial value.
//! 4. **Codes:** every code operation reads the seed fresh and builds a
//!    [`totp::TimeStepCodeEngine`]. Replacing the stored seed is all it takes to
//!    rotate it.
//!
//! ## Codes
//!
//! HMAC-SHA1, 6 digits, 30 second steps. Verification accepts the previous,
//! current and next step by default and compares in constant time.
//!
//! The seed, its base32 encoding and the private key are never logged and never
//! appear in error messages.

pub mod api;
pub mod cli;
pub mod error;
pub mod exchange;
pub mod seed;
pub mod totp;

pub use error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
