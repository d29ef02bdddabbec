// src/store/handoff.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use uuid::Uuid;

struct Entry<T> {
    payload: T,
    expires_at: Instant,
}

/// Write-once, read-once blob store keyed by a random token.
///
/// `take` removes the entry under the same lock that reads it, so of two
/// concurrent takes of one token exactly one gets the payload. Entries nobody
/// reads expire after the configured TTL.
pub struct HandoffStore<T> {
    entries: Arc<Mutex<HashMap<String, Entry<T>>>>,
    ttl: Duration,
}

impl<T> Clone for HandoffStore<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<T> HandoffStore<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `payload` under a fresh token and returns the token.
    pub fn put(&self, payload: T) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut entries = self.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token.clone(),
            Entry {
                payload,
                expires_at: now + self.ttl,
            },
        );

        token
    }

    /// Atomically reads and deletes. `None` if unknown, taken or expired.
    pub fn take(&self, token: &str) -> Option<T> {
        let entry = self.lock().remove(token)?;
        if entry.expires_at <= Instant::now() {
            tracing::debug!("Handoff {} expired before it was read", token);
            return None;
        }
        Some(entry.payload)
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_take_is_read_once() {
        let store = HandoffStore::new(Duration::from_secs(60));
        let token = store.put(vec![1, 2, 3]);

        assert_eq!(store.take(&token), Some(vec![1, 2, 3]));
        assert_eq!(store.take(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_takes_deliver_once() {
        for _ in 0..50 {
            let store = HandoffStore::new(Duration::from_secs(60));
            let token = store.put("review".to_string());

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = store.clone();
                    let token = token.clone();
                    thread::spawn(move || store.take(&token))
                })
                .collect();

            let results: Vec<Option<String>> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
            assert!(results.contains(&Some("review".to_string())));
        }
    }

    #[test]
    fn test_expired_entries_are_not_returned_and_swept() {
        let store = HandoffStore::new(Duration::ZERO);
        let first = store.put(1);
        let _second = store.put(2);

        assert_eq!(store.take(&first), None);
        assert_eq!(store.sweep(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_token() {
        let store: HandoffStore<u8> = HandoffStore::new(Duration::from_secs(60));
        assert_eq!(store.take("nope"), None);
    }
}
