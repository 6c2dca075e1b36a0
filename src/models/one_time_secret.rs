//! One-time secret record - OTP codes, email-verification and password-reset
//! tokens. Only the hashed form is ever persisted; the plaintext exists
//! once, in the issuance response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneTimeSecretKind {
    Otp,
    EmailVerification,
    PasswordReset,
}

impl OneTimeSecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OneTimeSecretKind::Otp => "otp",
            OneTimeSecretKind::EmailVerification => "email_verification",
            OneTimeSecretKind::PasswordReset => "password_reset",
        }
    }
}

/// Stored form of a one-time secret, keyed by the owning principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeSecret {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub kind: OneTimeSecretKind,
    pub secret_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OneTimeSecret {
    pub fn new(
        key: String,
        kind: OneTimeSecretKind,
        secret_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            key,
            kind,
            secret_hash,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
