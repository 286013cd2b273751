//! Per-IP rate limiting for the credential routes.
//!
//! A fixed-window counter per client address. State lives in process
//! memory, so each service instance limits independently. The address is
//! the socket peer unless proxy headers are explicitly trusted.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use flock_common::AppError;
use tokio::sync::RwLock;

/// Rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Limits for the credential routes.
pub mod limits {
    use super::RateLimitConfig;

    /// Login.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(10, 300);

    /// Registration.
    pub const SIGNUP: RateLimitConfig = RateLimitConfig::new(5, 3600);

    /// Longest window in use; entries older than twice this are dropped.
    pub const MAX_WINDOW_SECS: u64 = 3600;
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

impl Window {
    fn new() -> Self {
        Self {
            count: 0,
            started: Instant::now(),
        }
    }
}

/// Fixed-window rate limiter keyed by an arbitrary string.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl ApiRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let length = Duration::from_secs(config.window_secs);

        let window = windows.entry(key.to_string()).or_insert_with(Window::new);

        if now.duration_since(window.started) >= length {
            window.count = 0;
            window.started = now;
        }

        let reset = length
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.count >= config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset.max(1),
                limit: config.max_requests,
            };
        }

        window.count += 1;

        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(window.count),
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop windows that started more than twice `max_window_secs` ago.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let horizon = Duration::from_secs(max_window_secs * 2);

        windows.retain(|_, w| now.duration_since(w.started) < horizon);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        retry_after: u64,
        limit: u32,
    },
}

/// Limiter shared by the rate limit middlewares of one service.
#[derive(Clone, Default)]
pub struct RateLimiterState {
    pub ip_limiter: ApiRateLimiter,
    /// Key on `X-Forwarded-For` / `X-Real-IP` instead of the socket peer.
    /// Only safe behind a reverse proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl RateLimiterState {
    #[must_use]
    pub fn new(trust_proxy_headers: bool) -> Self {
        Self {
            ip_limiter: ApiRateLimiter::new(),
            trust_proxy_headers,
        }
    }

    /// Periodic sweep of stale windows.
    pub async fn cleanup(&self) {
        self.ip_limiter.cleanup(limits::MAX_WINDOW_SECS).await;
    }
}

/// Client address used as the rate limit key.
///
/// The socket peer, or with `trust_proxy_headers` the first
/// `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
fn extract_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = req
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if real_ip.is_some() {
            return real_ip;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Rate limiting middleware for login.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_config(limiter, req, next, "auth", &limits::AUTH).await
}

/// Rate limiting middleware for registration.
pub async fn rate_limit_signup_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_config(limiter, req, next, "signup", &limits::SIGNUP).await
}

async fn rate_limit_with_config(
    limiter: RateLimiterState,
    req: Request<Body>,
    next: Next,
    bucket: &str,
    config: &RateLimitConfig,
) -> Response {
    let client = extract_client_ip(&req, limiter.trust_proxy_headers)
        .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
    let key = format!("{bucket}:{client}");

    match limiter.ip_limiter.check(&key, config).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            response
        }
        RateLimitResult::Limited { retry_after, limit } => {
            tracing::warn!(key = %key, limit, "Rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
