//! Read-through cache for user lookups.
//!
//! Entries expire `ttl` after insertion. An expired entry is evicted only when
//! the same id is read again; ids that are never read again keep their stale
//! entry until they are invalidated.
//!
//! Every id carries a generation that [`UserCache::invalidate`] bumps. A reader
//! captures the generation before going to the store and hands it back to
//! [`UserCache::put`], which refuses the insert if a write invalidated the id
//! in between. Without that, a slow read could repopulate the cache with the
//! value a concurrent update just replaced.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::store::User;

#[derive(Debug, Clone)]
struct Cached {
    user: User,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    cached: Option<Cached>,
}

/// TTL cache keyed by user id. A zero TTL turns every `put` into a no-op.
#[derive(Debug)]
pub struct UserCache {
    ttl: Duration,
    slots: DashMap<String, Slot>,
}

impl UserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    /// Return the cached user for `id` if present and not yet expired.
    pub fn get(&self, id: &str) -> Option<User> {
        let now = Instant::now();
        {
            let slot = self.slots.get(id)?;
            match &slot.cached {
                Some(cached) if cached.expires_at > now => return Some(cached.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: re-check under the write lock, a `put` may have refreshed it.
        if let Some(mut slot) = self.slots.get_mut(id) {
            if slot.cached.as_ref().is_some_and(|c| c.expires_at <= now) {
                slot.cached = None;
            }
        }
        None
    }

    /// Current generation of `id`. Capture it before reading the store and
    /// pass it to [`put`](Self::put).
    pub fn generation(&self, id: &str) -> u64 {
        self.slots.get(id).map_or(0, |slot| slot.generation)
    }

    /// Cache `user` unless its id was invalidated after `generation` was
    /// read. Returns whether the entry was stored.
    pub fn put(&self, user: User, generation: u64) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let mut slot = self.slots.entry(user.id.clone()).or_default();
        if slot.generation != generation {
            return false;
        }
        let expires_at = Instant::now() + self.ttl;
        slot.cached = Some(Cached { user, expires_at });
        true
    }

    /// Drop the cached copy of `id` and fence off any read already in flight.
    pub fn invalidate(&self, id: &str) {
        let mut slot = self.slots.entry(id.to_string()).or_default();
        slot.generation += 1;
        slot.cached = None;
    }

    /// Number of users held, including expired ones not yet evicted.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.cached.is_some()).count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
