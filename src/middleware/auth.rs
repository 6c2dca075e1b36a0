//! Authentication gate: bearer extraction, token verification, payload and
//! status checks, and attachment of the authorization context.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

use crate::middleware::BoxAuthFuture;
use crate::models::{AccountStatus, ApprovalStatus, PrincipalKind};
use crate::services::{AccessClaims, AuthError};
use crate::AuthState;

const ACTIVE_ONLY: &[AccountStatus] = &[AccountStatus::Active];

/// Decoded, validated representation of the caller, attached to the request
/// after the gate accepts it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub id: String,
    pub email: String,
    pub kind: PrincipalKind,
    pub verified: bool,
    pub status: AccountStatus,
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub approval_status: Option<ApprovalStatus>,
    pub role: Option<String>,
    pub permissions: Option<HashMap<String, bool>>,
}

impl From<AccessClaims> for AuthContext {
    fn from(claims: AccessClaims) -> Self {
        let payload = claims.payload;
        Self {
            id: payload.sub,
            email: payload.email,
            kind: payload.kind,
            verified: payload.verified,
            status: payload.status,
            name: payload.name,
            student_id: payload.student_id,
            department: payload.department,
            approval_status: payload.approval_status,
            role: payload.role,
            permissions: payload.permissions,
        }
    }
}

/// Pull the token out of a `Bearer <token>` Authorization header. Absence
/// and malformation both yield `None`; the caller decides whether that is
/// fatal.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Run the full gate pipeline over a request's headers.
async fn resolve_context(
    state: &AuthState,
    headers: &HeaderMap,
    allowed: &'static [AccountStatus],
) -> Result<AuthContext, AuthError> {
    let token = extract_bearer(headers).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.verify_access_token(token)?;

    if claims.payload.sub.is_empty() || claims.payload.email.is_empty() {
        return Err(AuthError::InvalidPayload);
    }

    let mut ctx = AuthContext::from(claims);

    // Optionally trade the token's status snapshot for a live lookup.
    if state.revalidate_status {
        if let Some(store) = &state.principals {
            ctx.status = store
                .find_status(&ctx.id, ctx.kind)
                .await?
                .ok_or(AuthError::InvalidPayload)?;
        }
    }

    if !allowed.contains(&ctx.status) {
        if allowed == ACTIVE_ONLY {
            return Err(AuthError::InactiveAccount(ctx.status));
        }
        return Err(AuthError::InvalidAccountStatus {
            allowed,
            actual: ctx.status,
        });
    }

    Ok(ctx)
}

/// Mandatory authentication: any failure rejects the request.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = resolve_context(&state, req.headers(), ACTIVE_ONLY).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Mandatory authentication with a non-default allowed status set, for
/// endpoints such as verification submission that accept
/// `PENDING_VERIFICATION` callers.
pub fn authenticate_with_status(
    allowed: &'static [AccountStatus],
) -> impl Fn(State<AuthState>, Request, Next) -> BoxAuthFuture + Clone {
    move |State(state): State<AuthState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let ctx = resolve_context(&state, req.headers(), allowed).await?;
            req.extensions_mut().insert(ctx);
            Ok(next.run(req).await)
        })
    }
}

/// Optional authentication: the same pipeline, but every failure silently
/// continues without attaching a context.
pub async fn optional_authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_context(&state, req.headers(), ACTIVE_ONLY).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
        }
        Err(err) => {
            tracing::debug!(code = err.code(), "optional authentication skipped");
        }
    }

    next.run(req).await
}

/// Extractor handing handlers the authorization context attached by the
/// gate.
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::MissingToken)
    }
}
