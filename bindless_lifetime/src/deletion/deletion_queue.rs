use std::collections::VecDeque;

/// An object waiting for the GPU to pass `stamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionEntry<T> {
    pub item: T,
    pub stamp: u64,
}

/// Ordered list of retired objects awaiting GPU completion.
///
/// Entries are finalized exactly once, after being removed from the list.
/// Pending entries keep their relative order across sweeps.
#[derive(Debug)]
pub struct DeletionQueue<T> {
    entries: VecDeque<DeletionEntry<T>>,
}

impl<T> DeletionQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T, stamp: u64) {
        self.entries.push_back(DeletionEntry { item, stamp });
    }

    /// Finalize every entry with `stamp <= completed`; returns how many
    ///
    /// Works in place: each entry is popped once and either finalized or
    /// pushed back behind the entries not yet visited.
    pub fn reclaim<F: FnMut(T)>(&mut self, completed: u64, mut finalize: F) -> usize {
        if !self.entries.iter().any(|entry| entry.stamp <= completed) {
            return 0;
        }

        let mut count = 0;
        for _ in 0..self.entries.len() {
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            if entry.stamp <= completed {
                finalize(entry.item);
                count += 1;
            } else {
                self.entries.push_back(entry);
            }
        }
        count
    }

    /// Finalize everything regardless of stamp (device idle)
    pub fn drain_all<F: FnMut(T)>(&mut self, mut finalize: F) -> usize {
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            finalize(entry.item);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest stamp still pending
    pub fn oldest_stamp(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.stamp).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeletionEntry<T>> {
        self.entries.iter()
    }
}

impl<T> Default for DeletionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "deletion_queue_tests.rs"]
mod tests;
