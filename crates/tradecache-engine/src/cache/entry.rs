//! L1 cache entries.

use std::time::{Duration, Instant};

/// One in-process cache entry.
///
/// An entry is logically expired, and must be treated as absent, once its
/// TTL has elapsed since insertion; expiry is checked lazily on read and
/// swept periodically. Owned exclusively by the manager's L1 map.
#[derive(Debug, Clone)]
pub struct L1Entry {
    pub value: serde_json::Value,
    pub inserted_at: Instant,
    pub ttl: Duration,
    pub access_count: u64,
    pub last_accessed_at: Instant,
    /// Approximate footprint: key length plus serialized value length.
    pub size_bytes: usize,
}

impl L1Entry {
    pub fn new(value: serde_json::Value, ttl: Duration, size_bytes: usize) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            ttl,
            access_count: 0,
            last_accessed_at: now,
            size_bytes,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }

    /// Record an access for LRU bookkeeping.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_not_expired() {
        let entry = L1Entry::new(serde_json::json!(1), Duration::from_secs(60), 8);
        assert!(!entry.is_expired());
        assert_eq!(entry.access_count, 0);
    }

    #[test]
    fn test_zero_ttl_expires() {
        let entry = L1Entry::new(serde_json::json!(1), Duration::ZERO, 8);
        std::thread::sleep(Duration::from_millis(2));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_touch_updates_access() {
        let mut entry = L1Entry::new(serde_json::json!(1), Duration::from_secs(60), 8);
        let before = entry.last_accessed_at;
        std::thread::sleep(Duration::from_millis(2));
        entry.touch();
        assert_eq!(entry.access_count, 1);
        assert!(entry.last_accessed_at > before);
    }
}
