use crate::gpu_warn;

/// Last observed value of the GPU completion counter.
///
/// Monotonic: a raw reading lower than the previous observation is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionCounter {
    value: u64,
}

impl CompletionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a raw timeline reading into the counter and return the result
    pub fn observe(&mut self, raw: u64) -> u64 {
        if raw < self.value {
            gpu_warn!(
                "bindless::Device",
                "Completion counter went backwards ({} < {}), keeping {}",
                raw,
                self.value,
                self.value
            );
        } else {
            self.value = raw;
        }
        self.value
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Whether work stamped with `stamp` is known to be complete
    pub fn has_passed(&self, stamp: u64) -> bool {
        self.value >= stamp
    }
}

#[cfg(test)]
#[path = "completion_counter_tests.rs"]
mod tests;
