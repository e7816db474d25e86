//! Timer scheduler: a heap of `(deadline, callback)` entries behind a
//! single rearming tokio timer.
//!
//! One background task sleeps until the earliest deadline, runs every entry
//! that is due, then rearms for the next. Inserting an earlier deadline
//! wakes the task so the timer collapses correctly.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Handle to a scheduled entry, usable with [`Scheduler::cancel`]
pub type TimerId = u64;

type Callback = Box<dyn FnOnce() + Send>;

struct Entry {
    at: Instant,
    id: TimerId,
    callback: Callback,
}

// Heap order: earliest deadline first (BinaryHeap is a max-heap).
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Default)]
struct State {
    heap: BinaryHeap<Entry>,
    cancelled: HashSet<TimerId>,
    next_id: TimerId,
}

struct Inner {
    state: Mutex<State>,
    notify: Notify,
}

/// Shared timer scheduler
///
/// Cheap to clone; all clones feed the same heap and timer task. The task
/// exits shortly after the last handle is dropped, dropping any callbacks
/// that have not fired yet.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler and spawn its timer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
        });
        tokio::spawn(run_timer(Arc::downgrade(&inner)));
        Self { inner }
    }

    /// Schedule `callback` to run at `at`. Returns an id for cancellation.
    pub fn schedule(&self, at: Instant, callback: impl FnOnce() + Send + 'static) -> TimerId {
        let mut state = self.inner.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.heap.push(Entry {
            at,
            id,
            callback: Box::new(callback),
        });
        drop(state);
        // Wake the timer task so an earlier deadline rearms it.
        self.inner.notify.notify_one();
        id
    }

    /// Schedule `callback` after `delay` from now.
    pub fn schedule_after(
        &self,
        delay: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) -> TimerId {
        self.schedule(Instant::now() + delay, callback)
    }

    /// Cancel a pending entry. Cancelling an already-fired id is a no-op.
    pub fn cancel(&self, id: TimerId) {
        self.inner.state.lock().cancelled.insert(id);
    }

    /// Number of entries still pending (cancelled entries included until
    /// their deadline passes)
    pub fn pending(&self) -> usize {
        self.inner.state.lock().heap.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_timer(weak: Weak<Inner>) {
    loop {
        let Some(inner) = weak.upgrade() else { break };

        // Only the timer task is holding the scheduler: nothing can
        // schedule again, so stop.
        if Arc::strong_count(&inner) == 1 {
            break;
        }

        let (due, next) = {
            let mut state = inner.state.lock();
            let now = Instant::now();
            let mut due: Vec<Callback> = Vec::new();
            while state.heap.peek().is_some_and(|e| e.at <= now) {
                if let Some(entry) = state.heap.pop() {
                    if !state.cancelled.remove(&entry.id) {
                        due.push(entry.callback);
                    }
                }
            }
            (due, state.heap.peek().map(|e| e.at))
        };

        for callback in due {
            callback();
        }

        let notified = inner.notify.notified();
        match next {
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {}
                    _ = notified => {}
                }
            }
            None => {
                // Idle: park briefly so a dropped scheduler is noticed.
                let _ = tokio::time::timeout(Duration::from_secs(1), notified).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[tokio::test]
    async fn test_fires_in_deadline_order() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let now = Instant::now();
        for (label, ms) in [("b", 40u64), ("a", 20), ("c", 60)] {
            let log = log.clone();
            scheduler.schedule(now + Duration::from_millis(ms), move || {
                log.lock().push(label);
            });
        }

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        let id = scheduler.schedule_after(Duration::from_millis(30), move || {
            f.fetch_add(1, AtomicOrdering::SeqCst);
        });
        scheduler.cancel(id);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_earlier_insert_collapses_timer() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        scheduler.schedule_after(Duration::from_millis(200), move || {
            l.lock().push("late");
        });
        // Inserted after, due before: must still fire first.
        let l = log.clone();
        scheduler.schedule_after(Duration::from_millis(20), move || {
            l.lock().push("early");
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*log.lock(), vec!["early"]);
    }
}
