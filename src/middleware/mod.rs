use axum::response::Response;
use std::{future::Future, pin::Pin};

use crate::services::AuthError;

mod auth;
mod policy;
mod rate_limit;

/// Boxed future type for parameterized middleware built with
/// `axum::middleware::from_fn`.
pub type BoxAuthFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

pub use auth::{
    authenticate, authenticate_with_status, extract_bearer, optional_authenticate, AuthContext,
    Authenticated,
};
pub use policy::{
    require_account_status, require_approved_organization, require_email_verified,
    require_ownership, require_permission, require_role,
};
pub use rate_limit::{auth_rate_limit, AuthRateLimiter};
