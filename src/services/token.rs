//! Signed token codec: issuance and verification of access/refresh JWTs and
//! the canonical claim derivation for each principal kind.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::TokenConfig;
use crate::models::{AccountStatus, ApprovalStatus, Principal, PrincipalKind};
use crate::services::error::{AuthError, TokenFailure};

/// Canonical token payload derived from a principal at issuance time.
///
/// A snapshot: it stays authoritative until expiry and does not reflect
/// later mutations of the principal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub sub: String,
    pub email: String,
    pub kind: PrincipalKind,
    pub verified: bool,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<HashMap<String, bool>>,
}

/// Claims for access tokens (short-lived): the full payload plus the
/// registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub payload: ClaimSet,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims for refresh tokens (long-lived). Deliberately minimal so renewal
/// has to re-derive the full payload from the principal store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub kind: PrincipalKind,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token pair returned to the client after login or refresh.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Token codec over two HS256 secrets, one per token class.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_minutes: i64,
    refresh_expiry_days: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Result<Self, anyhow::Error> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(anyhow::anyhow!("token signing secrets must not be empty"));
        }
        if config.access_secret == config.refresh_secret {
            return Err(anyhow::anyhow!(
                "access and refresh tokens must use distinct secrets"
            ));
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expiry_minutes: config.access_expiry_minutes,
            refresh_expiry_days: config.refresh_expiry_days,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Map a principal to its canonical token payload. Pure and
    /// deterministic; the single dispatch point over the principal tag.
    pub fn derive_claims(principal: &Principal) -> ClaimSet {
        let mut claims = ClaimSet {
            sub: principal.id().to_string(),
            email: principal.email().to_string(),
            kind: principal.kind(),
            verified: principal.email_verified(),
            status: principal.status(),
            name: Some(principal.name().to_string()),
            student_id: None,
            department: None,
            approval_status: None,
            role: None,
            permissions: None,
        };

        match principal {
            Principal::Member(m) => {
                claims.student_id = m.student_id.clone();
                claims.department = m.department.clone();
            }
            Principal::Organization(o) => {
                claims.approval_status = Some(o.approval_status);
            }
            Principal::Administrator(a) => {
                claims.role = Some(a.role.clone());
                claims.permissions = Some(a.permissions.clone());
            }
        }

        claims
    }

    /// Sign an access token over the given payload. Failure here means the
    /// signer is misconfigured and is not retryable.
    pub fn issue_access_token(&self, payload: ClaimSet) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            payload,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_expiry_minutes)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("failed to sign access token: {}", e)))
    }

    /// Sign a refresh token carrying only the principal identity.
    pub fn issue_refresh_token(
        &self,
        sub: &str,
        kind: PrincipalKind,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: sub.to_string(),
            kind,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.refresh_expiry_days)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding).map_err(|e| {
            AuthError::Internal(anyhow::anyhow!("failed to sign refresh token: {}", e))
        })
    }

    /// Derive the payload and issue both tokens for a principal.
    pub fn issue_token_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let payload = Self::derive_claims(principal);
        let access_token = self.issue_access_token(payload)?;
        let refresh_token = self.issue_refresh_token(principal.id(), principal.kind())?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_expiry_minutes * 60,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let token_data = decode::<AccessClaims>(token, &self.access_decoding, &self.validation())
            .map_err(|e| self.rejected("access", e))?;
        Ok(token_data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let token_data = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation())
            .map_err(|e| self.rejected("refresh", e))?;
        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation
    }

    fn rejected(&self, class: &'static str, err: jsonwebtoken::errors::Error) -> AuthError {
        let failure = match err.kind() {
            ErrorKind::ExpiredSignature => TokenFailure::Expired,
            ErrorKind::InvalidSignature => TokenFailure::BadSignature,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenFailure::ClaimMismatch,
            _ => TokenFailure::Malformed,
        };
        tracing::debug!(class, failure = failure.as_str(), "token verification failed");
        AuthError::InvalidToken(failure)
    }
}
