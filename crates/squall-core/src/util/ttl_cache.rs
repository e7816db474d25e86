//! In-memory cache with absolute per-entry expiry.
//!
//! Every entry owns a scheduler timer that removes it at its deadline;
//! replacing a key cancels the stale timer. Reads also filter expired
//! entries so behavior does not depend on timer latency.

use crate::util::scheduler::{Scheduler, TimerId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    expires_at: Instant,
    generation: u64,
    timer: TimerId,
}

struct Inner<K, V> {
    map: Mutex<HashMap<K, Slot<V>>>,
}

/// Mapping K→V where each entry expires at an absolute deadline
pub struct TtlCache<K, V> {
    inner: Arc<Inner<K, V>>,
    scheduler: Scheduler,
    generation: Arc<Mutex<u64>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(Inner {
                map: Mutex::new(HashMap::new()),
            }),
            scheduler,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Insert `value` under `key`, expiring at `expires_at`.
    ///
    /// Replacing an existing key cancels its removal timer.
    pub fn put(&self, key: K, value: V, expires_at: Instant) {
        let generation = {
            let mut g = self.generation.lock();
            *g += 1;
            *g
        };

        let weak = Arc::downgrade(&self.inner);
        let timer_key = key.clone();
        let timer = self.scheduler.schedule(expires_at, move || {
            if let Some(inner) = weak.upgrade() {
                let mut map = inner.map.lock();
                // Only evict the entry this timer was armed for.
                if map.get(&timer_key).is_some_and(|s| s.generation == generation) {
                    map.remove(&timer_key);
                }
            }
        });

        let mut map = self.inner.map.lock();
        if let Some(old) = map.insert(
            key,
            Slot {
                value,
                expires_at,
                generation,
                timer,
            },
        ) {
            self.scheduler.cancel(old.timer);
        }
    }

    /// Look up a live entry; expired entries read as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.map.lock();
        map.get(key)
            .filter(|slot| slot.expires_at > Instant::now())
            .map(|slot| slot.value.clone())
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut map = self.inner.map.lock();
        map.remove(key).map(|slot| {
            self.scheduler.cancel(slot.timer);
            slot.value
        })
    }

    pub fn len(&self) -> usize {
        self.inner.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.map.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut map = self.inner.map.lock();
        for (_, slot) in map.drain() {
            self.scheduler.cancel(slot.timer);
        }
    }
}
