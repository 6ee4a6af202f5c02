//! Deferred destruction keyed on the GPU completion counter
//!
//! Dropped handles push their native object into a [`RetireList`], stamped
//! with the current submission number. The device sweeps the lists once the
//! completion counter has caught up with the stamp.

mod completion_counter;
mod deletion_queue;
mod retire_list;

pub use completion_counter::CompletionCounter;
pub use deletion_queue::{DeletionEntry, DeletionQueue};
pub use retire_list::{RetireList, SubmissionClock};
