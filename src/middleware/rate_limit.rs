use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tastebook_shared::Error;

use crate::error::AppError;

/// Attempts allowed per client on the credential endpoints per window.
pub const AUTH_MAX_ATTEMPTS: u32 = 10;
pub const AUTH_WINDOW_SECS: i64 = 15 * 60;

/// Fixed-window request limiter keyed by client address, applied to the
/// credential endpoints so they cannot be brute-forced.
pub struct RateLimiter {
    max_attempts: u32,
    window_secs: i64,
    windows: Mutex<HashMap<String, (u32, i64)>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_secs: i64) -> Self {
        Self {
            max_attempts,
            window_secs,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Charge one attempt for `key`; `false` means the window is spent.
    pub fn try_acquire(&self, key: &str, now: i64) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = windows.entry(key.to_string()).or_insert((0, now));
        if now - entry.1 >= self.window_secs {
            *entry = (0, now);
        }
        if entry.0 >= self.max_attempts {
            return false;
        }
        entry.0 += 1;
        true
    }
}

/// Proxy-forwarded address first, then the socket peer; requests with
/// neither share one bucket.
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let key = client_key(&req);
    if !limiter.try_acquire(&key, tastebook_db::now()) {
        tracing::warn!(client = %key, "rate limit exceeded");
        return Err(AppError(Error::TooManyRequests(
            "Too many attempts, please try again later".to_string(),
        ))
        .into_response());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_enforced_per_key() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.try_acquire("a", 0));
        assert!(limiter.try_acquire("a", 1));
        assert!(!limiter.try_acquire("a", 2));
        // A different client is unaffected.
        assert!(limiter.try_acquire("b", 2));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.try_acquire("a", 0));
        assert!(!limiter.try_acquire("a", 59));
        assert!(limiter.try_acquire("a", 60));
    }
}
