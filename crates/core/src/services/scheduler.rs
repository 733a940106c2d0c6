use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of "now" for debouncing, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// Per-key trailing debounce.
///
/// Scheduling a key that is already pending pushes its deadline out
/// (last write wins); a key fires once, after `delay` of quiet.
#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    delay: Duration,
    deadlines: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadlines: HashMap::new(),
        }
    }

    /// (Re)arm `key` to fire at `now + delay`. Returns the deadline.
    pub fn schedule(&mut self, key: K, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.deadlines.insert(key, deadline);
        deadline
    }

    /// Returns `true` if `key` was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.deadlines.remove(key).is_some()
    }

    /// Remove and return every key whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.deadlines.remove(key);
        }
        due
    }

    /// Remove and return every pending key regardless of deadline.
    pub fn drain_all(&mut self) -> Vec<K> {
        self.deadlines.drain().map(|(key, _)| key).collect()
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.deadlines.is_empty()
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the delay for future schedules; pending deadlines are kept.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}
