//! Property-based tests against the invariants in `src/invariants.rs` and
//! `spec.md` §8, exercised single-threaded (sequential enqueue/dequeue
//! interleavings). Concurrent interleaving coverage lives in each module's
//! `#[cfg(test)]` block instead, where real threads are needed.

use proptest::prelude::*;
use ringqueue_rs::{CompactMpmcHandleQueue, MpmcQueue, SeqMpmcQueue, SpscQueue};
use std::collections::VecDeque;

// INV-CAP-01: capacity is always a power of two >= 2, for every family.
proptest! {
    #[test]
    fn prop_capacity_always_rounds_to_power_of_two(requested in 2usize..5000) {
        let capacity = MpmcQueue::<u32>::new(requested).capacity();
        prop_assert!(capacity.is_power_of_two());
        prop_assert!(capacity >= requested);
        prop_assert!(capacity / 2 < requested || requested == capacity);
    }
}

// INV-SEQ-01 / FIFO ordering for SP/SC: sequential interleaving model.
proptest! {
    #[test]
    fn prop_spsc_sequential_fifo(
        ops in prop::collection::vec(prop::bool::ANY, 1..200),
    ) {
        let queue = SpscQueue::<u32>::new(8);
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next_value = 0u32;

        for enqueue_op in ops {
            if enqueue_op {
                match queue.enqueue(next_value) {
                    Ok(()) => {
                        model.push_back(next_value);
                        next_value += 1;
                    }
                    Err(_) => {}
                }
            } else if let Ok(v) = queue.dequeue() {
                let expected = model.pop_front();
                prop_assert_eq!(Some(v), expected);
            }
        }
    }
}

// INV-SEQ-01 for the FAA-cycle MP/MC family, single-threaded interleaving
// (no concurrent races, so this reduces to the same FIFO model as SP/SC).
proptest! {
    #[test]
    fn prop_faa_cycle_sequential_fifo(
        ops in prop::collection::vec(prop::bool::ANY, 1..200),
    ) {
        let queue = MpmcQueue::<u32>::new(8);
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next_value = 0u32;

        for enqueue_op in ops {
            if enqueue_op {
                if queue.enqueue(next_value).is_ok() {
                    model.push_back(next_value);
                    next_value += 1;
                }
            } else if let Ok(v) = queue.dequeue() {
                let expected = model.pop_front();
                prop_assert_eq!(Some(v), expected);
            }
        }
    }
}

// Same model, CAS-sequence compact family.
proptest! {
    #[test]
    fn prop_cas_sequence_sequential_fifo(
        ops in prop::collection::vec(prop::bool::ANY, 1..200),
    ) {
        let queue = SeqMpmcQueue::<u32>::new(8);
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next_value = 0u32;

        for enqueue_op in ops {
            if enqueue_op {
                if queue.enqueue(next_value).is_ok() {
                    model.push_back(next_value);
                    next_value += 1;
                }
            } else if let Ok(v) = queue.dequeue() {
                let expected = model.pop_front();
                prop_assert_eq!(Some(v), expected);
            }
        }
    }
}

// INV-RES-01 analog: fill-to-capacity then drain-to-empty never loses or
// duplicates an element, for any capacity.
proptest! {
    #[test]
    fn prop_fill_drain_cycles_preserve_fifo(
        capacity in 2usize..64,
        cycles in 1usize..20,
    ) {
        let queue = MpmcQueue::<u64>::new(capacity);
        let actual_capacity = queue.capacity() as u64;

        for cycle in 0..cycles as u64 {
            for i in 0..actual_capacity {
                prop_assert!(queue.enqueue(cycle * 1000 + i).is_ok());
            }
            prop_assert!(queue.enqueue(u64::MAX).is_err());

            for i in 0..actual_capacity {
                prop_assert_eq!(queue.dequeue(), Ok(cycle * 1000 + i));
            }
            prop_assert!(queue.dequeue().is_err());
        }
    }
}

// `spec.md` §8 scenario 3 and §4.6: zero is legal and distinct from empty;
// any value with the high bit set aborts.
proptest! {
    #[test]
    fn prop_compact_handle_63_bit_domain_round_trips(value in 0u64..(1u64 << 63)) {
        let queue = CompactMpmcHandleQueue::new(4);
        prop_assert!(queue.enqueue(value).is_ok());
        prop_assert_eq!(queue.dequeue(), Ok(value));
    }
}

#[test]
fn compact_handle_high_bit_value_aborts() {
    let queue = CompactMpmcHandleQueue::new(4);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        queue.enqueue(1u64 << 63)
    }));
    assert!(result.is_err());
}
