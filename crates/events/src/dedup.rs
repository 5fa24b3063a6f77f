//! In-memory idempotency window (§4.6 "Idempotency").
//!
//! The `(topic, message_id)` unique index in `events_mirror` is the
//! authoritative dedup mechanism; this is a fast-path cache so a replayed
//! message within the 10-minute window can be acked without a round trip
//! to the database at all.

use dashmap::DashMap;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(600);

#[derive(Clone, Default)]
pub struct DedupCache {
    seen: DashMap<(String, String), Instant>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `(topic, message_id)` was already seen within the
    /// window, recording it either way.
    pub fn check_and_record(&self, topic: &str, message_id: &str) -> bool {
        let key = (topic.to_string(), message_id.to_string());
        let now = Instant::now();

        if let Some(seen_at) = self.seen.get(&key) {
            if now.duration_since(*seen_at) < WINDOW {
                return true;
            }
        }

        self.seen.insert(key, now);
        self.sweep(now);
        false
    }

    fn sweep(&self, now: Instant) {
        self.seen.retain(|_, seen_at| now.duration_since(*seen_at) < WINDOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_not_a_duplicate() {
        let cache = DedupCache::new();
        assert!(!cache.check_and_record("events/created", "abc"));
    }

    #[test]
    fn replay_within_window_is_flagged_duplicate() {
        let cache = DedupCache::new();
        assert!(!cache.check_and_record("events/created", "abc"));
        assert!(cache.check_and_record("events/created", "abc"));
    }

    #[test]
    fn distinct_topics_do_not_collide() {
        let cache = DedupCache::new();
        assert!(!cache.check_and_record("events/created", "abc"));
        assert!(!cache.check_and_record("events/updated", "abc"));
    }
}
