use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{AccountStatus, ApprovalStatus, PrincipalKind};

/// Internal reason a token failed verification. Logged for operability;
/// clients always receive the same generic message regardless of the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    Malformed,
    Expired,
    BadSignature,
    ClaimMismatch,
}

impl TokenFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenFailure::Malformed => "malformed",
            TokenFailure::Expired => "expired",
            TokenFailure::BadSignature => "bad_signature",
            TokenFailure::ClaimMismatch => "claim_mismatch",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken(TokenFailure),

    #[error("Token payload is missing required fields")]
    InvalidPayload,

    #[error("Account is not active: {0}")]
    InactiveAccount(AccountStatus),

    #[error("Account status {actual} is not permitted here")]
    InvalidAccountStatus {
        allowed: &'static [AccountStatus],
        actual: AccountStatus,
    },

    #[error("Access restricted to {required:?}, requester is {actual}")]
    InsufficientRole {
        required: &'static [PrincipalKind],
        actual: PrincipalKind,
    },

    #[error("Missing required permission: {0}")]
    InsufficientPermission(&'static str),

    #[error("Email verification required")]
    EmailNotVerified,

    #[error("Organization approval required, current status: {0}")]
    OrganizationNotApproved(ApprovalStatus),

    #[error("You do not have access to this resource")]
    OwnershipViolation,

    #[error("Too many attempts, retry in {retry_after}s")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Stored credential hash is malformed")]
    CorruptedCredential,

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Stable machine-readable reason code reported to the caller.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "TOKEN_REQUIRED",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::InvalidPayload => "INVALID_PAYLOAD",
            AuthError::InactiveAccount(_) => "ACCOUNT_NOT_ACTIVE",
            AuthError::InvalidAccountStatus { .. } => "ACCOUNT_STATUS_NOT_ALLOWED",
            AuthError::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            AuthError::InsufficientPermission(_) => "PERMISSION_DENIED",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::OrganizationNotApproved(_) => "ORGANIZATION_NOT_APPROVED",
            AuthError::OwnershipViolation => "OWNERSHIP_REQUIRED",
            AuthError::RateLimitExceeded { .. } => "RATE_LIMITED",
            AuthError::CorruptedCredential => "CREDENTIAL_CORRUPTED",
            AuthError::Database(_) => "DATABASE_ERROR",
            AuthError::Config(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, message, extra, retry_after) = match &self {
            AuthError::MissingToken | AuthError::InvalidPayload => {
                (StatusCode::UNAUTHORIZED, self.to_string(), None, None)
            }
            AuthError::InvalidToken(failure) => {
                tracing::debug!(failure = failure.as_str(), "token rejected");
                (StatusCode::UNAUTHORIZED, self.to_string(), None, None)
            }
            AuthError::InactiveAccount(status) => (
                StatusCode::UNAUTHORIZED,
                self.to_string(),
                Some(json!({ "status": status })),
                None,
            ),
            AuthError::InvalidAccountStatus { allowed, actual } => (
                StatusCode::UNAUTHORIZED,
                self.to_string(),
                Some(json!({ "allowed": allowed, "status": actual })),
                None,
            ),
            AuthError::InsufficientRole { required, actual } => (
                StatusCode::FORBIDDEN,
                self.to_string(),
                Some(json!({ "required": required, "actual": actual })),
                None,
            ),
            AuthError::InsufficientPermission(permission) => (
                StatusCode::FORBIDDEN,
                self.to_string(),
                Some(json!({ "permission": permission })),
                None,
            ),
            AuthError::EmailNotVerified => (StatusCode::FORBIDDEN, self.to_string(), None, None),
            AuthError::OrganizationNotApproved(approval) => (
                StatusCode::FORBIDDEN,
                self.to_string(),
                Some(json!({ "approval_status": approval })),
                None,
            ),
            AuthError::OwnershipViolation => (StatusCode::FORBIDDEN, self.to_string(), None, None),
            AuthError::RateLimitExceeded { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                self.to_string(),
                Some(json!({ "retry_after_seconds": retry_after })),
                Some(*retry_after),
            ),
            AuthError::CorruptedCredential => {
                tracing::error!("stored credential hash is malformed, upstream data corruption");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
            AuthError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
            AuthError::Config(err) | AuthError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        let mut body = json!({
            "success": false,
            "code": code,
            "message": message,
        });

        if let (Value::Object(map), Some(Value::Object(extra))) = (&mut body, extra) {
            map.extend(extra);
        }

        let mut res = (status, Json(body)).into_response();
        if let Some(retry) = retry_after {
            res.headers_mut().insert(header::RETRY_AFTER, retry.into());
        }

        res
    }
}
