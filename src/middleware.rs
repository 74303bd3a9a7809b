//! Rate limiting and security headers

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde_json::json;

// ============================================================================
// Rate Limiting
// ============================================================================

/// Rate limit configuration
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Requests per second for general API
    pub general_rps: u32,
    /// Requests per minute for login attempts
    pub auth_rpm: u32,
    /// Requests per hour for registration
    pub register_rph: u32,
    /// Requests per minute for exports
    pub export_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_rps: 100,
            auth_rpm: 10,
            register_rph: 5,
            export_rpm: 30,
        }
    }
}

/// Per-IP rate limit state
pub struct RateLimitState {
    /// General API limiter
    pub general: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    /// Per-IP limiters
    pub per_ip: DashMap<IpAddr, IpLimiters>,
}

pub struct IpLimiters {
    pub auth: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    pub register: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    pub export: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
}

impl RateLimitState {
    pub fn new(config: &RateLimitConfig) -> Self {
        let general_quota =
            Quota::per_second(std::num::NonZeroU32::new(config.general_rps).unwrap());

        Self {
            general: RateLimiter::direct(general_quota),
            per_ip: DashMap::new(),
        }
    }

    pub fn get_ip_limiters(
        &self,
        ip: IpAddr,
        config: &RateLimitConfig,
    ) -> dashmap::mapref::one::RefMut<'_, IpAddr, IpLimiters> {
        self.per_ip.entry(ip).or_insert_with(|| {
            let auth_quota = Quota::per_minute(std::num::NonZeroU32::new(config.auth_rpm).unwrap());
            let register_quota =
                Quota::per_hour(std::num::NonZeroU32::new(config.register_rph).unwrap());
            let export_quota =
                Quota::per_minute(std::num::NonZeroU32::new(config.export_rpm).unwrap());

            IpLimiters {
                auth: RateLimiter::direct(auth_quota),
                register: RateLimiter::direct(register_quota),
                export: RateLimiter::direct(export_quota),
            }
        })
    }
}

/// Extract client IP from request
fn get_client_ip(request: &Request) -> Option<IpAddr> {
    // Check X-Forwarded-For header first (for proxied requests)
    if let Some(forwarded) = request.headers().get("X-Forwarded-For") {
        if let Ok(s) = forwarded.to_str() {
            if let Some(first_ip) = s.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("X-Real-IP") {
        if let Ok(s) = real_ip.to_str() {
            if let Ok(ip) = s.parse() {
                return Some(ip);
            }
        }
    }

    None
}

/// Rate limiting middleware
pub async fn rate_limit(
    State(rate_state): State<Arc<RateLimitState>>,
    request: Request,
    next: Next,
) -> Response {
    let config = RateLimitConfig::default();
    let path = request.uri().path();
    let method = request.method().clone();

    if rate_state.general.check().is_err() {
        return rate_limit_response("Too many requests - server is busy");
    }

    let client_ip = get_client_ip(&request).unwrap_or_else(|| "127.0.0.1".parse().unwrap());

    let limiters = rate_state.get_ip_limiters(client_ip, &config);

    if path.starts_with("/api/auth/login") && method == Method::POST {
        if limiters.auth.check().is_err() {
            drop(limiters);
            return rate_limit_response("Too many login attempts. Please wait a minute.");
        }
    }

    if path.starts_with("/api/auth/register") && method == Method::POST {
        if limiters.register.check().is_err() {
            drop(limiters);
            return rate_limit_response("Registration rate limit exceeded. Please try again later.");
        }
    }

    if path.starts_with("/api/export") {
        if limiters.export.check().is_err() {
            drop(limiters);
            return rate_limit_response("Too many export requests. Please wait before retrying.");
        }
    }

    drop(limiters);
    next.run(request).await
}

fn rate_limit_response(message: &str) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": message,
            "code": "RATE_LIMITED"
        })),
    )
        .into_response()
}

// ============================================================================
// Security Headers
// ============================================================================

/// Add security headers to all responses
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", "SAMEORIGIN".parse().unwrap());
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert(
        "Referrer-Policy",
        "strict-origin-when-cross-origin".parse().unwrap(),
    );

    response
}
