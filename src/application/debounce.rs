// Keyed debounce timers
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    timer: JoinHandle<()>,
}

/// One pending timer per key. Scheduling again under the same key cancels the pending
/// timer and starts a new quiet period.
///
/// A timer that already fired may have its notification in flight when it gets
/// replaced, so the receiver confirms with `complete` before acting on it.
pub struct Debouncer<K> {
    pending: HashMap<K, Pending>,
    next_generation: u64,
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            next_generation: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fire(generation)` once `delay` passes without another `schedule` for `key`.
    pub fn schedule<F, Fut>(&mut self, key: K, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation).await;
        });
        self.pending.insert(key, Pending { generation, timer });
        generation
    }

    /// True if `generation` is the live timer for `key`; the key is no longer pending afterwards.
    pub fn complete(&mut self, key: &K, generation: u64) -> bool {
        match self.pending.get(key) {
            Some(p) if p.generation == generation => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn cancel(&mut self, key: &K) {
        if let Some(p) = self.pending.remove(key) {
            p.timer.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, p) in self.pending.drain() {
            p.timer.abort();
        }
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for p in self.pending.values() {
            p.timer.abort();
        }
    }
}
