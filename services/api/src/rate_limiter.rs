//! Rate limiter for failed token requests
//!
//! Failures are counted per key (the normalized email) inside a sliding
//! window; reaching the limit bans the key for a while. A successful login
//! clears the key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    failures: u32,
    window_started: Instant,
    ban_expires: Option<Instant>,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` may attempt to authenticate right now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(key).and_then(|entry| entry.ban_expires) {
            Some(ban_expires) if now < ban_expires => false,
            Some(_) => {
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    /// Count a failed attempt; bans the key once the limit is reached
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        // keys whose window and ban have both run out carry no state
        entries.retain(|_, entry| {
            now.duration_since(entry.window_started) < window
                || entry.ban_expires.is_some_and(|ban_expires| now < ban_expires)
        });

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            failures: 0,
            window_started: now,
            ban_expires: None,
        });

        if now.duration_since(entry.window_started) >= window {
            entry.failures = 0;
            entry.window_started = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned key {} for {} seconds after {} failed attempts",
                key, self.config.ban_duration_seconds, entry.failures
            );
        }
    }

    /// Forget everything recorded for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32, ban_duration_seconds: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds,
        })
    }

    #[tokio::test]
    async fn bans_after_max_failures() {
        let limiter = limiter(3, 3600);

        for _ in 0..2 {
            limiter.record_failure("a@example.com").await;
            assert!(limiter.is_allowed("a@example.com").await);
        }

        limiter.record_failure("a@example.com").await;
        assert!(!limiter.is_allowed("a@example.com").await);
        assert!(limiter.is_allowed("b@example.com").await);
    }

    #[tokio::test]
    async fn reset_clears_failures() {
        let limiter = limiter(2, 3600);

        limiter.record_failure("a@example.com").await;
        limiter.reset("a@example.com").await;
        limiter.record_failure("a@example.com").await;

        assert!(limiter.is_allowed("a@example.com").await);
    }

    #[tokio::test]
    async fn ban_expires() {
        let limiter = limiter(1, 0);

        limiter.record_failure("a@example.com").await;
        assert!(limiter.is_allowed("a@example.com").await);
    }

    #[tokio::test]
    async fn stale_entries_are_pruned() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 0,
        });

        for i in 0..100 {
            limiter.record_failure(&format!("user{}@example.com", i)).await;
        }

        assert_eq!(limiter.entries.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn banned_keys_survive_pruning() {
        let limiter = limiter(1, 3600);

        limiter.record_failure("a@example.com").await;
        limiter.record_failure("b@example.com").await;

        assert!(!limiter.is_allowed("a@example.com").await);
        assert_eq!(limiter.entries.lock().await.len(), 2);
    }

    #[test]
    fn default_config() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.window_seconds, 300);
        assert_eq!(config.ban_duration_seconds, 3600);
    }
}
