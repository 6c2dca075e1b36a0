//! One-time secret issuance: OTP codes, email-verification and
//! password-reset tokens.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::models::OneTimeSecretKind;

pub const DEFAULT_OTP_LENGTH: usize = 6;
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generate a numeric one-time code of `length` digits.
///
/// Drawn from the thread RNG: adequate for short-lived codes delivered out
/// of band, not a hardened secret. Use [`generate_secure_token`] for
/// anything that lives longer than a few minutes.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generate a cryptographically strong random token, hex-encoded.
pub fn generate_secure_token(byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest of a secret, hex-encoded.
///
/// Deterministic and unsalted on purpose: stored hashes are looked up by
/// exact match against a freshly hashed candidate.
pub fn hash_secret(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time equality over two hex digests.
pub fn secrets_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// A freshly issued secret. The plaintext is returned exactly once; callers
/// hand only `hashed` to a store.
#[derive(Debug, Clone)]
pub struct IssuedSecret {
    pub plaintext: String,
    pub hashed: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a one-time secret of the given kind.
///
/// OTP kinds produce a short numeric code; token kinds produce a strong
/// hex token. Expiry is wall-clock `now + expiry_minutes`.
pub fn issue_one_time_secret(kind: OneTimeSecretKind, expiry_minutes: i64) -> IssuedSecret {
    let plaintext = match kind {
        OneTimeSecretKind::Otp => generate_otp(DEFAULT_OTP_LENGTH),
        OneTimeSecretKind::EmailVerification | OneTimeSecretKind::PasswordReset => {
            generate_secure_token(DEFAULT_TOKEN_BYTES)
        }
    };

    IssuedSecret {
        hashed: hash_secret(&plaintext),
        plaintext,
        expires_at: Utc::now() + Duration::minutes(expiry_minutes),
    }
}
