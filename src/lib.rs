//! Authentication, token lifecycle, and authorization core for the
//! CampusHub event platform.
//!
//! The platform's HTTP services mount this crate's middleware on their
//! routers: the authentication gate verifies bearer tokens and attaches an
//! [`middleware::AuthContext`], the policy guards enforce role, permission,
//! verification, approval, and ownership rules on top of it, and the rate
//! limiter protects credential-submission endpoints. Token and one-time
//! secret issuance live in [`services`]; persistence of secrets and
//! principals stays behind the store traits.

pub mod config;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;

use std::sync::Arc;

pub use config::AuthConfig;
pub use middleware::{AuthContext, Authenticated};
pub use services::{AuthError, TokenService};

use services::PrincipalStore;

/// Shared state for the authentication gate.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
    pub principals: Option<Arc<dyn PrincipalStore>>,
    pub revalidate_status: bool,
}

impl AuthState {
    /// Gate that trusts the status snapshot embedded in the token. Cheapest
    /// option; accepts staleness until token expiry.
    pub fn new(tokens: TokenService) -> Self {
        Self {
            tokens,
            principals: None,
            revalidate_status: false,
        }
    }

    /// Gate that re-reads the live account status on every request, at the
    /// cost of one store lookup per request.
    pub fn with_live_status(tokens: TokenService, principals: Arc<dyn PrincipalStore>) -> Self {
        Self {
            tokens,
            principals: Some(principals),
            revalidate_status: true,
        }
    }
}
