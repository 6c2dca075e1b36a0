//! Sliding-window rate limiter for credential-submission endpoints, keyed
//! by (client address, submitted email).
//!
//! Counts attempts, not failures: attach it only to endpoints where that is
//! the intended semantics (login, OTP send, password-reset request).

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use http_body_util::BodyExt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::AuthError;

#[derive(Debug)]
struct AttemptWindow {
    count: u32,
    started_at: Instant,
}

/// Keyed attempt counter with a fixed window per key. Entries are purged
/// lazily on every check; races under extreme concurrency can undercount,
/// which is acceptable for a defense-in-depth limiter.
pub struct AuthRateLimiter {
    attempts: DashMap<(IpAddr, String), AttemptWindow>,
    max_attempts: u32,
    window: Duration,
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Arc<Self> {
        Arc::new(Self {
            attempts: DashMap::new(),
            max_attempts: max_attempts.max(1),
            window,
        })
    }

    /// Record an attempt for `(addr, email)`. Returns the remaining window
    /// time when the attempt budget is exhausted.
    pub fn check(&self, addr: IpAddr, email: &str) -> Result<(), Duration> {
        self.attempts
            .retain(|_, window| window.started_at.elapsed() < self.window);

        let key = (addr, email.trim().to_ascii_lowercase());
        let mut entry = self.attempts.entry(key).or_insert_with(|| AttemptWindow {
            count: 0,
            started_at: Instant::now(),
        });

        if entry.started_at.elapsed() >= self.window {
            entry.count = 0;
            entry.started_at = Instant::now();
        }

        entry.count += 1;
        if entry.count > self.max_attempts {
            let remaining = self.window.saturating_sub(entry.started_at.elapsed());
            return Err(remaining);
        }

        Ok(())
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware enforcing the limiter. Buffers the JSON body to read the
/// submitted `email`, then restores it for the downstream handler.
pub async fn auth_rate_limit(
    State(limiter): State<Arc<AuthRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let addr = match client_ip(&request) {
        Some(addr) => addr,
        None => {
            tracing::warn!("could not determine client address for rate limiting");
            return Ok(next.run(request).await);
        }
    };

    let (parts, body) = request.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("failed to buffer request body: {}", e)))?
        .to_bytes();

    let email = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("email").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_default();

    let request = Request::from_parts(parts, Body::from(bytes));

    match limiter.check(addr, &email) {
        Ok(()) => Ok(next.run(request).await),
        Err(remaining) => Err(AuthError::RateLimitExceeded {
            retry_after: remaining.as_secs().max(1),
        }),
    }
}
