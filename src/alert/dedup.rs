//! Time-windowed dedup table: the same opportunity key seen again inside the
//! TTL is suppressed, so a venue held at the same spread for several scan
//! passes only alerts once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub struct DedupTable {
    seen: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl DedupTable {
    pub fn new(ttl: Duration) -> Self {
        Self { seen: Mutex::new(HashMap::new()), ttl }
    }

    /// Returns `true` (and records `key` as seen) if `key` is new or its
    /// previous sighting has aged out of the TTL window.
    pub fn admit(&self, key: &str, now: Instant) -> bool {
        let mut seen = self.seen.lock();
        match seen.get(key) {
            Some(last) if now.duration_since(*last) < self.ttl => false,
            _ => {
                seen.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Drops entries older than the TTL. Called periodically so the table
    /// doesn't grow unbounded over a long-running process.
    pub fn evict(&self, now: Instant) {
        self.seen.lock().retain(|_, last| now.duration_since(*last) < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_key_within_ttl_is_suppressed() {
        let table = DedupTable::new(Duration::from_secs(30));
        let t0 = Instant::now();
        assert!(table.admit("CROSS|a|b|BTC/USDT|100", t0));
        assert!(!table.admit("CROSS|a|b|BTC/USDT|100", t0));
    }

    #[test]
    fn evict_drops_aged_entries() {
        let table = DedupTable::new(Duration::from_millis(10));
        let t0 = Instant::now();
        table.admit("k", t0);
        let later = t0 + Duration::from_millis(20);
        table.evict(later);
        assert!(table.is_empty());
    }
}
