//! Unit tests for retire_list.rs

use super::*;
use std::thread;

// ============================================================================
// SUBMISSION CLOCK
// ============================================================================

#[test]
fn test_clock_starts_at_zero_and_advances() {
    let clock = SubmissionClock::new();
    assert_eq!(clock.current(), 0);
    assert_eq!(clock.advance(), 1);
    assert_eq!(clock.advance(), 2);
    assert_eq!(clock.clone().current(), 2);
}

// ============================================================================
// RETIRE / RECLAIM
// ============================================================================

#[test]
fn test_retire_stamps_with_current_submission() {
    let clock = SubmissionClock::new();
    let list = RetireList::new(clock.clone(), "buffer");

    list.retire(1u32);
    clock.advance();
    list.retire(2u32);

    assert_eq!(list.pending(), 2);
    assert_eq!(list.oldest_stamp(), Some(0));

    let mut finalized = Vec::new();
    assert_eq!(list.reclaim(0, |item| finalized.push(item)), 1);
    assert_eq!(finalized, vec![1]);
    assert_eq!(list.oldest_stamp(), Some(1));
}

// ============================================================================
// CLOSE
// ============================================================================

#[test]
fn test_close_drains_and_refuses_further_items() {
    let list = RetireList::new(SubmissionClock::new(), "image");
    list.retire(7u32);

    let mut finalized = Vec::new();
    assert_eq!(list.close(|item| finalized.push(item)), 1);
    assert_eq!(finalized, vec![7]);
    assert!(list.is_closed());

    list.retire(8u32);
    assert_eq!(list.pending(), 0);
}

#[test]
fn test_close_racing_with_retire_leaves_nothing_queued() {
    for _ in 0..10 {
        let list = Arc::new(RetireList::new(SubmissionClock::new(), "descriptor"));
        let token = Arc::new(());

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let list = Arc::clone(&list);
                let token = Arc::clone(&token);
                thread::spawn(move || {
                    for _ in 0..25 {
                        list.retire(Arc::clone(&token));
                    }
                })
            })
            .collect();

        let mut finalized = 0;
        list.close(|_| finalized += 1);
        for producer in producers {
            producer.join().unwrap();
        }

        // Every item was either finalized by close or refused and leaked
        assert_eq!(list.pending(), 0);
        let leaked = Arc::strong_count(&token) - 1;
        assert_eq!(finalized + leaked, 100);
    }
}
