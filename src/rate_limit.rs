//! Sliding-window request limiter guarding the decision-evaluation boundary.

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const ANONYMOUS_CLIENT: &str = "anonymous";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Per-client request counter. Owned and injected rather than global, so each
/// service (or test) gets its own state.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, client_key: &str, limit: u32, window: Duration) -> bool {
        self.allow_at(client_key, limit, window, Instant::now())
    }

    pub fn allow_at(&self, client_key: &str, limit: u32, window: Duration, now: Instant) -> bool {
        self.evict_expired(window, now, client_key);

        let mut entry = self.windows.entry(client_key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        if entry.count == 0 || now.saturating_duration_since(entry.started_at) >= window {
            entry.count = 1;
            entry.started_at = now;
            return true;
        }

        entry.count = entry.count.saturating_add(1);
        let allowed = entry.count <= limit;
        if !allowed {
            tracing::warn!(
                client = client_key,
                count = entry.count,
                limit,
                "rate limit exceeded"
            );
        }
        allowed
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    fn evict_expired(&self, window: Duration, now: Instant, keep: &str) {
        self.windows.retain(|key, state| {
            key == keep || now.saturating_duration_since(state.started_at) < window
        });
    }
}

/// Normalises an origin or host header into a limiter key.
pub fn client_key_from_origin(origin: Option<&str>) -> String {
    let Some(raw) = origin.map(str::trim).filter(|value| !value.is_empty()) else {
        return ANONYMOUS_CLIENT.to_string();
    };
    let without_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    if host.is_empty() {
        ANONYMOUS_CLIENT.to_string()
    } else {
        host.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    #[test]
    fn sixth_call_in_window_is_denied() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for i in 0..5 {
            let now = start + Duration::from_millis(i * 1000);
            assert!(limiter.allow_at("client", 5, WINDOW, now), "call {i} should pass");
        }
        assert!(!limiter.allow_at("client", 5, WINDOW, start + Duration::from_secs(10)));
    }

    #[test]
    fn window_expiry_resets_count() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..6 {
            limiter.allow_at("client", 5, WINDOW, start);
        }
        assert!(!limiter.allow_at("client", 5, WINDOW, start + Duration::from_secs(59)));
        assert!(limiter.allow_at("client", 5, WINDOW, start + WINDOW));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.allow_at("a", 5, WINDOW, now));
        }
        assert!(!limiter.allow_at("a", 5, WINDOW, now));
        assert!(limiter.allow_at("b", 5, WINDOW, now));
    }

    #[test]
    fn stale_windows_are_evicted() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.allow_at("a", 5, WINDOW, start);
        limiter.allow_at("b", 5, WINDOW, start);
        assert_eq!(limiter.tracked_clients(), 2);
        limiter.allow_at("c", 5, WINDOW, start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn origin_is_normalised() {
        assert_eq!(
            client_key_from_origin(Some("https://Game.Example.com/play")),
            "game.example.com"
        );
        assert_eq!(client_key_from_origin(Some("10.0.0.2")), "10.0.0.2");
        assert_eq!(client_key_from_origin(Some("  ")), ANONYMOUS_CLIENT);
        assert_eq!(client_key_from_origin(None), ANONYMOUS_CLIENT);
    }
}
