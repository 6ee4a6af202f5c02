use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::deletion::DeletionQueue;
use crate::gpu_warn;

/// Submission number shared between a device and the handles it created.
///
/// Holds the timeline value that the submission currently being recorded
/// will signal. Only the device advances it.
#[derive(Debug, Clone, Default)]
pub struct SubmissionClock {
    value: Arc<AtomicU64>,
}

impl SubmissionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Move to the next submission number and return it
    pub(crate) fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }
}

struct RetireState<T> {
    queue: DeletionQueue<T>,
    /// Set by `close`; checked under the same lock as every push
    closed: bool,
}

/// Deletion queue fed from handle destructors.
///
/// Shared through `Arc` between the device (sole consumer) and every live
/// handle (producers). `retire` stamps the item with the clock's current
/// submission number.
pub struct RetireList<T> {
    clock: SubmissionClock,
    state: Mutex<RetireState<T>>,
    label: &'static str,
}

impl<T> RetireList<T> {
    pub fn new(clock: SubmissionClock, label: &'static str) -> Self {
        Self {
            clock,
            state: Mutex::new(RetireState {
                queue: DeletionQueue::new(),
                closed: false,
            }),
            label,
        }
    }

    fn state(&self) -> MutexGuard<'_, RetireState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue `item` for destruction once the current submission completes
    pub fn retire(&self, item: T) {
        let mut state = self.state();
        if state.closed {
            drop(state);
            gpu_warn!(
                "bindless::Device",
                "{} retired after device shutdown, native object leaked",
                self.label
            );
            std::mem::forget(item);
            return;
        }
        let stamp = self.clock.current();
        state.queue.push(item, stamp);
    }

    /// Finalize every entry the GPU has provably finished with
    pub fn reclaim<F: FnMut(T)>(&self, completed: u64, finalize: F) -> usize {
        self.state().queue.reclaim(completed, finalize)
    }

    /// Finalize every entry and refuse further retirements
    pub(crate) fn close<F: FnMut(T)>(&self, finalize: F) -> usize {
        let mut state = self.state();
        state.closed = true;
        state.queue.drain_all(finalize)
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    pub fn oldest_stamp(&self) -> Option<u64> {
        self.state().queue.oldest_stamp()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
#[path = "retire_list_tests.rs"]
mod tests;
