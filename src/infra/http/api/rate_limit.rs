use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sliding-window limiter keyed by caller and route.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Record a request; returns `false` once the window is full.
    pub fn allow(&self, key: &str, route: &str) -> bool {
        self.allow_at(key, route, Instant::now())
    }

    fn allow_at(&self, key: &str, route: &str, now: Instant) -> bool {
        let bucket_key = format!("{key}:{route}");
        let window = self.window;

        let mut entry = self.buckets.entry(bucket_key).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        if entry.len() >= self.max_requests as usize {
            return false;
        }

        entry.push(now);
        true
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_once_window_is_full() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();
        assert!(limiter.allow_at("api", "/api/v1/posts", now));
        assert!(limiter.allow_at("api", "/api/v1/posts", now));
        assert!(!limiter.allow_at("api", "/api/v1/posts", now));
        // other routes keep their own budget
        assert!(limiter.allow_at("api", "/api/v1/stats", now));
    }

    #[test]
    fn window_slides() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(1), 1);
        let start = Instant::now();
        assert!(limiter.allow_at("api", "/x", start));
        assert!(!limiter.allow_at("api", "/x", start + Duration::from_millis(500)));
        assert!(limiter.allow_at("api", "/x", start + Duration::from_millis(1500)));
    }
}
