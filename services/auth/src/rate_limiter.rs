//! Rate limiter for preventing brute force attacks on login

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed
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

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Number of attempts
    attempts: u32,
    /// Last attempt time
    last_attempt: Instant,
    /// Ban expiration time
    ban_expires: Option<Instant>,
}

/// Rate limiter keyed by login identifier
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

    /// Record an attempt for `key` and report whether it may proceed
    ///
    /// Entries whose window and ban have both run out are dropped on the way.
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        entries.retain(|_, entry| {
            let banned = entry.ban_expires.is_some_and(|expires| now < expires);
            banned || now.duration_since(entry.last_attempt) < window
        });

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            last_attempt: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.last_attempt) >= window {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;

        true
    }

    /// Forget the attempts for `key`, e.g. after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        })
    }

    #[tokio::test]
    async fn bans_after_max_attempts() {
        let limiter = limiter(2);

        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);

        assert!(limiter.is_allowed("grace@example.com").await);
    }

    #[tokio::test]
    async fn reset_clears_attempts() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("ada@example.com").await);
        limiter.reset("ada@example.com").await;
        assert!(limiter.is_allowed("ada@example.com").await);
        assert_eq!(limiter.config().max_attempts, 1);
    }

    #[tokio::test]
    async fn zero_length_ban_expires_immediately() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 300,
            ban_duration_seconds: 0,
        });

        assert!(limiter.is_allowed("k").await);
        assert!(!limiter.is_allowed("k").await);
        assert!(limiter.is_allowed("k").await);
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 0,
        });

        for i in 0..50 {
            assert!(limiter.is_allowed(&format!("user{i}@example.com")).await);
        }
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn live_windows_and_bans_are_kept() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);
        assert!(limiter.is_allowed("grace@example.com").await);

        assert_eq!(limiter.tracked_keys().await, 2);
        assert!(!limiter.is_allowed("ada@example.com").await);
    }
}
