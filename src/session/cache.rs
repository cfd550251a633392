//! Verified-session memoization
//!
//! Maps a raw session token string to the identity it decoded to, so repeat
//! requests skip HMAC verification. A hit is only a shortcut: a miss always
//! falls through to a full decode.

use moka::sync::Cache;
use sso_core::Identity;

/// Token → identity cache shared by every frontend host.
///
/// Implementations synchronize internally; `get` and `put` are independently
/// callable from any number of request tasks.
pub trait SessionCache: Send + Sync {
    /// Look up a previously verified token
    fn get(&self, token: &str) -> Option<Identity>;

    /// Remember a verified token
    fn put(&self, token: &str, identity: Identity);
}

/// Capacity-bounded [`SessionCache`] backed by `moka`
pub struct BoundedSessionCache {
    entries: Cache<String, Identity>,
    capacity: u64,
}

impl BoundedSessionCache {
    /// Create a cache holding at most `capacity` tokens
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            capacity,
        }
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of cached tokens, after applying pending evictions
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl SessionCache for BoundedSessionCache {
    fn get(&self, token: &str) -> Option<Identity> {
        self.entries.get(token)
    }

    fn put(&self, token: &str, identity: Identity) {
        self.entries.insert(token.to_string(), identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("alice@org.com", "Alice", "")
    }

    #[test]
    fn get_after_put() {
        let cache = BoundedSessionCache::new(50);
        assert!(cache.get("sig,payload").is_none());

        cache.put("sig,payload", alice());
        assert_eq!(cache.get("sig,payload"), Some(alice()));
        assert!(cache.get("sig,other").is_none());
    }

    #[test]
    fn stays_within_capacity() {
        let cache = BoundedSessionCache::new(50);
        for i in 0..500 {
            cache.put(&format!("sig{i},payload"), alice());
        }
        assert!(cache.entry_count() <= cache.capacity());
    }

    #[test]
    fn usable_as_trait_object_across_threads() {
        let cache: std::sync::Arc<dyn SessionCache> =
            std::sync::Arc::new(BoundedSessionCache::new(50));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        let token = format!("t{t}-{i},p");
                        cache.put(&token, alice());
                        let _ = cache.get(&token);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..4 {
            for i in 0..10 {
                assert!(cache.get(&format!("t{t}-{i},p")).is_some());
            }
        }
    }
}
