//! Time-stepped one-time codes derived from the provisioned seed.
//!
//! The algorithm parameters are fixed for every process that shares a seed:
//! HMAC-SHA1, 6 digits, 30 second steps. Changing any of them produces codes
//! that silently disagree with every other party, so they are constants rather
//! than configuration.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use crate::{
    error::{Error, Result},
    seed::Seed,
};
use base32::Alphabet;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::Arc};
use subtle::{Choice, ConstantTimeEq};
use totp_rs::{Algorithm, Secret, TOTP};
use zeroize::Zeroizing;

/// Number of digits in a code.
pub const DIGITS: usize = 6;
/// Length of one time step in seconds.
pub const STEP_SECONDS: u64 = 30;
/// Adjacent steps accepted on either side of the current one.
pub const DEFAULT_TOLERANCE_WINDOW: u32 = 1;

const ISSUER: &str = "pki-totp";
const ACCOUNT: &str = "seed";

/// The seed bytes in RFC 4648 base32, padding included.
#[derive(Clone)]
pub struct EncodedSecret(SecretString);

impl EncodedSecret {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self(SecretString::from(base32::encode(
            Alphabet::Rfc4648 { padding: true },
            bytes,
        )))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Decode back into key bytes the way the code generator reads them.
    fn key_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        Secret::Encoded(self.expose().to_string())
            .to_bytes()
            .map(Zeroizing::new)
            .map_err(|_| Error::InvalidHexSeed)
    }
}

impl fmt::Debug for EncodedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedSecret([REDACTED])")
    }
}

/// A code together with how long it stays current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCode {
    pub code: String,
    /// Seconds until the next step boundary, always in `1..=30`.
    pub remaining_seconds: u64,
}

/// Generates and verifies time-step codes for one secret.
///
/// Holds no mutable state: every result is a function of the secret and the
/// time reported by the clock at the moment of the call.
#[derive(Clone)]
pub struct TimeStepCodeEngine {
    totp: TOTP,
    secret: EncodedSecret,
    clock: Arc<dyn Clock>,
}

impl TimeStepCodeEngine {
    /// Build an engine from a hex seed, using the system clock.
    ///
    /// The seed is re-encoded as base32 and the generator is keyed from that
    /// encoding.
    ///
    /// # Errors
    /// Returns `InvalidHexSeed` if the seed is empty, has odd length, contains
    /// a non-hex character or is shorter than 128 bits.
    pub fn from_hex_seed(seed: &str) -> Result<Self> {
        if seed.is_empty() {
            return Err(Error::InvalidHexSeed);
        }

        let bytes = Zeroizing::new(hex::decode(seed).map_err(|_| Error::InvalidHexSeed)?);
        let secret = EncodedSecret::from_bytes(&bytes);

        let totp = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            0,
            STEP_SECONDS,
            secret.key_bytes()?.to_vec(),
            Some(ISSUER.to_string()),
            ACCOUNT.to_string(),
        )
        .map_err(|_| Error::InvalidHexSeed)?;

        Ok(Self {
            totp,
            secret,
            clock: Arc::new(SystemClock),
        })
    }

    /// # Errors
    /// Returns `InvalidHexSeed` if the stored seed is not valid hex.
    pub fn from_seed(seed: &Seed) -> Result<Self> {
        Self::from_hex_seed(seed.expose())
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn encoded_secret(&self) -> &EncodedSecret {
        &self.secret
    }

    /// Code for a single time step.
    #[must_use]
    pub fn code_at_step(&self, step: u64) -> String {
        self.totp.generate(step.saturating_mul(STEP_SECONDS))
    }

    #[must_use]
    pub fn generate_at(&self, unix_time: u64) -> CurrentCode {
        CurrentCode {
            code: self.code_at_step(unix_time / STEP_SECONDS),
            remaining_seconds: STEP_SECONDS - unix_time % STEP_SECONDS,
        }
    }

    #[must_use]
    pub fn generate_current(&self) -> CurrentCode {
        self.generate_at(self.clock.now())
    }

    /// Check `candidate` against every step in `S - window ..= S + window`.
    ///
    /// All steps in the window are compared in constant time, so the running
    /// time does not depend on which step (if any) matched.
    ///
    /// # Errors
    /// Returns `InvalidCodeFormat` before any HMAC work if the candidate is not
    /// exactly six ASCII digits.
    pub fn check_at(&self, candidate: &str, unix_time: u64, window: u32) -> Result<bool> {
        if !is_well_formed(candidate) {
            return Err(Error::InvalidCodeFormat);
        }

        let current = unix_time / STEP_SECONDS;
        let window = u64::from(window);
        let mut matched = Choice::from(0);

        for step in current.saturating_sub(window)..=current.saturating_add(window) {
            let expected = self.code_at_step(step);
            matched |= expected.as_bytes().ct_eq(candidate.as_bytes());
        }

        Ok(bool::from(matched))
    }

    /// # Errors
    /// Returns `InvalidCodeFormat` if the candidate is not a six digit code.
    pub fn check(&self, candidate: &str, window: u32) -> Result<bool> {
        self.check_at(candidate, self.clock.now(), window)
    }

    /// Like [`check`](Self::check) but a malformed candidate is simply not valid.
    #[must_use]
    pub fn verify(&self, candidate: &str, window: u32) -> bool {
        self.check(candidate, window).unwrap_or(false)
    }
}

impl fmt::Debug for TimeStepCodeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeStepCodeEngine")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == DIGITS && candidate.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
    // ASCII "12345678901234567890", the RFC 6238 SHA-1 secret.
    const RFC6238_SEED: &str = "3132333435363738393031323334353637383930";

    fn engine_at(seed: &str, now: u64) -> Result<TimeStepCodeEngine> {
        Ok(TimeStepCodeEngine::from_hex_seed(seed)?.with_clock(Arc::new(FixedClock(now))))
    }

    #[test]
    fn rfc6238_sha1_vectors() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(RFC6238_SEED)?;
        let vectors = [
            (59, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
            (20_000_000_000, "353130"),
        ];
        for (time, expected) in vectors {
            assert_eq!(engine.generate_at(time).code, expected, "time {time}");
        }
        Ok(())
    }

    #[test]
    fn matches_reference_implementation() -> anyhow::Result<()> {
        let engine = engine_at(TEST_SEED, 30_000)?;
        let reference = TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            hex::decode(TEST_SEED)?,
            Some("pki-totp".to_string()),
            "test".to_string(),
        )
        .map_err(|e| anyhow::anyhow!("TOTP init error: {e}"))?;

        let current = engine.generate_current();
        assert_eq!(current.code, "190460");
        assert_eq!(current.code, reference.generate(30_000));

        for time in [0, 29, 30, 59_999, 1_700_000_000] {
            assert_eq!(engine.generate_at(time).code, reference.generate(time));
        }
        Ok(())
    }

    #[test]
    fn encoded_secret_is_padded_base32() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        let encoded = engine.encoded_secret().expose();
        assert_eq!(
            encoded,
            "UGZMHVHF6YDRQKJ2JNOG27UPSCQ3FQ6U4X3AOGBJHJFVY3L6R6IA===="
        );
        assert_eq!(
            base32::decode(Alphabet::Rfc4648 { padding: true }, encoded),
            Some(hex::decode(TEST_SEED)?)
        );
        Ok(())
    }

    #[test]
    fn same_step_is_deterministic() -> anyhow::Result<()> {
        let first = engine_at(TEST_SEED, 30_000)?.generate_current();
        let again = engine_at(TEST_SEED, 30_000)?.generate_current();
        let end_of_step = engine_at(TEST_SEED, 30_029)?.generate_current();
        assert_eq!(first.code, again.code);
        assert_eq!(first.code, end_of_step.code);

        let next_step = engine_at(TEST_SEED, 30_030)?.generate_current();
        assert_eq!(next_step.code, "866699");
        Ok(())
    }

    #[test]
    fn remaining_seconds_counts_down_to_rollover() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        for time in [0u64, 1, 15, 29, 30, 31, 59, 30_000, 1_700_000_013] {
            let remaining = engine.generate_at(time).remaining_seconds;
            assert!((1..=30).contains(&remaining), "time {time}");
            assert_eq!(remaining, 30 - time % 30);
        }
        assert_eq!(engine.generate_at(30_000).remaining_seconds, 30);
        assert_eq!(engine.generate_at(30_029).remaining_seconds, 1);
        Ok(())
    }

    #[test]
    fn tolerance_window_accepts_adjacent_steps_only() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        let code = engine.generate_at(30_000).code;

        // Step 1000 code checked from steps 999, 1000 and 1001.
        for time in [29_970, 29_999, 30_000, 30_029, 30_030, 30_059] {
            assert!(engine.check_at(&code, time, 1)?, "time {time}");
        }
        // Steps 998 and 1002 are out of reach.
        for time in [29_940, 29_969, 30_060, 30_089] {
            assert!(!engine.check_at(&code, time, 1)?, "time {time}");
        }
        // A wider window reaches them.
        assert!(engine.check_at(&code, 29_940, 2)?);
        assert!(engine.check_at(&code, 30_060, 2)?);
        // A zero window only accepts the exact step.
        assert!(engine.check_at(&code, 30_000, 0)?);
        assert!(!engine.check_at(&code, 30_030, 0)?);
        Ok(())
    }

    #[test]
    fn verify_uses_injected_clock() -> anyhow::Result<()> {
        let engine = engine_at(TEST_SEED, 30_031)?;
        assert!(engine.verify("190460", DEFAULT_TOLERANCE_WINDOW));
        assert!(engine.verify("716373", DEFAULT_TOLERANCE_WINDOW));
        assert!(!engine.verify("099310", DEFAULT_TOLERANCE_WINDOW));
        Ok(())
    }

    #[test]
    fn window_at_epoch_does_not_underflow() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        assert!(engine.check_at("728740", 0, 1)?);
        assert!(engine.check_at("572105", 0, 1)?);
        assert!(!engine.check_at("714266", 0, 1)?);
        Ok(())
    }

    #[test]
    fn malformed_candidates_are_rejected() -> anyhow::Result<()> {
        let engine = engine_at(TEST_SEED, 30_000)?;
        for candidate in ["", "12345", "1234567", "19046a", " 190460", "19 460", "١٩٠٤٦٠"] {
            assert!(
                matches!(engine.check(candidate, 1), Err(Error::InvalidCodeFormat)),
                "candidate {candidate:?}"
            );
            assert!(!engine.verify(candidate, 1));
        }
        Ok(())
    }

    #[test]
    fn codes_are_keyed_from_base32_secret() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        let encoded = engine.encoded_secret().expose().to_string();
        let reference = TOTP::new(
            Algorithm::SHA1,
            6,
            0,
            30,
            Secret::Encoded(encoded)
                .to_bytes()
                .map_err(|e| anyhow::anyhow!("Secret parse error: {e:?}"))?,
            Some("pki-totp".to_string()),
            "test".to_string(),
        )
        .map_err(|e| anyhow::anyhow!("TOTP init error: {e}"))?;

        for step in [0u64, 1, 999, 1000, 1001, 56_666_666] {
            assert_eq!(engine.code_at_step(step), reference.generate(step * 30));
        }
        Ok(())
    }

    #[test]
    fn short_seed_is_rejected() {
        assert!(matches!(
            TimeStepCodeEngine::from_hex_seed("a1b2c3d4"),
            Err(Error::InvalidHexSeed)
        ));
    }

    #[test]
    fn non_hex_seed_is_rejected() {
        let corrupted = format!("zz{}", &TEST_SEED[2..]);
        assert!(matches!(
            TimeStepCodeEngine::from_hex_seed(&corrupted),
            Err(Error::InvalidHexSeed)
        ));
        assert!(matches!(
            TimeStepCodeEngine::from_hex_seed(&TEST_SEED[..63]),
            Err(Error::InvalidHexSeed)
        ));
        assert!(matches!(
            TimeStepCodeEngine::from_hex_seed(""),
            Err(Error::InvalidHexSeed)
        ));
    }

    #[test]
    fn uppercase_hex_gives_same_codes() -> anyhow::Result<()> {
        let lower = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        let upper = TimeStepCodeEngine::from_hex_seed(&TEST_SEED.to_ascii_uppercase())?;
        assert_eq!(lower.generate_at(30_000), upper.generate_at(30_000));
        Ok(())
    }

    #[test]
    fn debug_is_redacted() -> anyhow::Result<()> {
        let engine = TimeStepCodeEngine::from_hex_seed(TEST_SEED)?;
        let rendered = format!("{engine:?}");
        assert!(!rendered.contains("UGZMHVHF"));
        assert!(!rendered.contains(TEST_SEED));
        Ok(())
    }
}
