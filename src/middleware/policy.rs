//! Authorization policy guards, layered after the authentication gate.
//!
//! Every guard is local and synchronous over the request: it reads the
//! attached [`AuthContext`], decides, and either forwards the request or
//! rejects it with a stable reason code. Nothing is retried.

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;

use crate::middleware::{AuthContext, BoxAuthFuture};
use crate::models::{AccountStatus, ApprovalStatus, PrincipalKind};
use crate::services::AuthError;

fn context(req: &Request) -> Result<AuthContext, AuthError> {
    // Absent context means the gate never ran; fail closed.
    req.extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AuthError::MissingToken)
}

/// Allow only the given principal kinds.
pub fn require_role(
    allowed: &'static [PrincipalKind],
) -> impl Fn(Request, Next) -> BoxAuthFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let ctx = context(&req)?;
            if !allowed.contains(&ctx.kind) {
                return Err(AuthError::InsufficientRole {
                    required: allowed,
                    actual: ctx.kind,
                });
            }
            Ok(next.run(req).await)
        })
    }
}

/// Allow only administrators holding the named permission.
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> BoxAuthFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let ctx = context(&req)?;
            if ctx.kind != PrincipalKind::Administrator {
                return Err(AuthError::InsufficientRole {
                    required: &[PrincipalKind::Administrator],
                    actual: ctx.kind,
                });
            }

            let granted = ctx
                .permissions
                .as_ref()
                .and_then(|perms| perms.get(permission))
                .copied()
                .unwrap_or(false);

            if !granted {
                return Err(AuthError::InsufficientPermission(permission));
            }
            Ok(next.run(req).await)
        })
    }
}

/// Allow only callers whose email has been verified.
pub async fn require_email_verified(req: Request, next: Next) -> Result<Response, AuthError> {
    let ctx = context(&req)?;
    if !ctx.verified {
        return Err(AuthError::EmailNotVerified);
    }
    Ok(next.run(req).await)
}

/// Allow only organizations that have been approved.
pub async fn require_approved_organization(
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = context(&req)?;
    if ctx.kind != PrincipalKind::Organization {
        return Err(AuthError::InsufficientRole {
            required: &[PrincipalKind::Organization],
            actual: ctx.kind,
        });
    }

    match ctx.approval_status {
        Some(ApprovalStatus::Approved) => Ok(next.run(req).await),
        Some(status) => Err(AuthError::OrganizationNotApproved(status)),
        None => Err(AuthError::OrganizationNotApproved(ApprovalStatus::Pending)),
    }
}

/// Allow only the listed account statuses, for endpoints whose allowed set
/// differs from the gate's default.
pub fn require_account_status(
    allowed: &'static [AccountStatus],
) -> impl Fn(Request, Next) -> BoxAuthFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let ctx = context(&req)?;
            if !allowed.contains(&ctx.status) {
                return Err(AuthError::InvalidAccountStatus {
                    allowed,
                    actual: ctx.status,
                });
            }
            Ok(next.run(req).await)
        })
    }
}

/// Allow administrators unconditionally; everyone else must own the
/// resource. The owner id is read from the route path parameter named
/// `field`, falling back to the same field in the JSON body. No owner id
/// found means rejection.
pub fn require_ownership(
    field: &'static str,
) -> impl Fn(Request, Next) -> BoxAuthFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let ctx = context(&req)?;
            if ctx.kind == PrincipalKind::Administrator {
                return Ok(next.run(req).await);
            }

            let (mut parts, body) = req.into_parts();

            let mut owner = match RawPathParams::from_request_parts(&mut parts, &()).await {
                Ok(params) => params
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map(|(_, value)| value.to_string()),
                Err(_) => None,
            };

            let bytes = body.collect().await.map_err(|e| {
                AuthError::Internal(anyhow::anyhow!("failed to buffer request body: {}", e))
            })?.to_bytes();

            if owner.is_none() && !bytes.is_empty() {
                owner = serde_json::from_slice::<serde_json::Value>(&bytes)
                    .ok()
                    .and_then(|v| v.get(field).and_then(|x| x.as_str()).map(str::to_owned));
            }

            let req = Request::from_parts(parts, Body::from(bytes));

            match owner {
                Some(owner) if owner == ctx.id => Ok(next.run(req).await),
                _ => Err(AuthError::OwnershipViolation),
            }
        })
    }
}
