//! Loom-based concurrency model checks for the SPSC and FAA-cycle cores.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings under the C11 memory
//! model, so these models are deliberately re-implemented against
//! `loom::sync::atomic` rather than exercising the real `src/` types (which
//! are built on `std`/`portable_atomic` atomics loom cannot instrument).
//! Capacities are kept tiny (2-4 slots) since the interleaving space grows
//! with both capacity and thread count.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;
use std::cell::UnsafeCell;

/// Bounded retry count for a spinning consumer/producer inside a loom model.
/// Loom explores every interleaving of a fixed number of steps; an
/// unbounded spin would make the state space infinite, so callers cap how
/// many times they retry before giving up.
const MAX_ATTEMPTS: usize = 8;

// ---------------------------------------------------------------------
// SPSC Lamport ring model (mirrors `src/spsc/generic.rs`'s algorithm body).
// ---------------------------------------------------------------------

struct LoomSpscRing {
    tail: AtomicU64,
    cached_head: AtomicU64,
    head: AtomicU64,
    cached_tail: AtomicU64,
    capacity: u64,
    mask: u64,
    buffer: UnsafeCell<[u64; 4]>,
}

unsafe impl Send for LoomSpscRing {}
unsafe impl Sync for LoomSpscRing {}

impl LoomSpscRing {
    fn new(capacity: u64) -> Self {
        Self {
            tail: AtomicU64::new(0),
            cached_head: AtomicU64::new(0),
            head: AtomicU64::new(0),
            cached_tail: AtomicU64::new(0),
            capacity,
            mask: capacity - 1,
            buffer: UnsafeCell::new([0; 4]),
        }
    }

    fn enqueue(&self, value: u64) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let mut cached_head = self.cached_head.load(Ordering::Relaxed);
        if tail.wrapping_sub(cached_head) >= self.capacity {
            cached_head = self.head.load(Ordering::Acquire);
            self.cached_head.store(cached_head, Ordering::Relaxed);
            if tail.wrapping_sub(cached_head) >= self.capacity {
                return false;
            }
        }

        let idx = (tail & self.mask) as usize;
        unsafe {
            (*self.buffer.get())[idx] = value;
        }
        self.tail.store(tail + 1, Ordering::Release);
        true
    }

    fn dequeue(&self) -> Option<u64> {
        let head = self.head.load(Ordering::Relaxed);
        let mut cached_tail = self.cached_tail.load(Ordering::Relaxed);
        if head == cached_tail {
            cached_tail = self.tail.load(Ordering::Acquire);
            self.cached_tail.store(cached_tail, Ordering::Relaxed);
            if head == cached_tail {
                return None;
            }
        }

        let idx = (head & self.mask) as usize;
        let value = unsafe { (*self.buffer.get())[idx] };
        self.head.store(head + 1, Ordering::Release);
        Some(value)
    }
}

#[test]
fn loom_spsc_preserves_fifo_order() {
    loom::model(|| {
        let ring = Arc::new(LoomSpscRing::new(4));
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            assert!(producer_ring.enqueue(1));
            assert!(producer_ring.enqueue(2));
        });

        let consumer = thread::spawn(move || {
            let mut received = Vec::new();
            for _ in 0..MAX_ATTEMPTS {
                if let Some(v) = ring.dequeue() {
                    received.push(v);
                }
                if received.len() == 2 {
                    break;
                }
                thread::yield_now();
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        if received.len() == 2 {
            assert_eq!(received, vec![1, 2]);
        }
    });
}

#[test]
fn loom_spsc_full_ring_rejects_until_drained() {
    loom::model(|| {
        let ring = Arc::new(LoomSpscRing::new(2));
        assert!(ring.enqueue(10));
        assert!(ring.enqueue(20));
        assert!(!ring.enqueue(30));

        let consumer_ring = Arc::clone(&ring);
        let consumer = thread::spawn(move || consumer_ring.dequeue());

        let freed = consumer.join().unwrap();
        assert_eq!(freed, Some(10));
        assert!(ring.enqueue(30));
    });
}

// ---------------------------------------------------------------------
// FAA-cycle core model (mirrors `src/faa_cycle/core.rs`'s claim/publish
// protocol: `2n` physical slots, a cycle tag per slot, an FAA-based claim
// on `tail`/`head`, and the livelock threshold).
// ---------------------------------------------------------------------

struct LoomFaaCycleRing {
    head: AtomicU64,
    tail: AtomicU64,
    threshold: AtomicI64,
    draining: AtomicBool,
    capacity: u64,
    slot_count: u64,
    slots: [AtomicU64; 4],
    values: UnsafeCell<[u64; 4]>,
}

unsafe impl Send for LoomFaaCycleRing {}
unsafe impl Sync for LoomFaaCycleRing {}

impl LoomFaaCycleRing {
    /// `capacity` physical slots are `2 * capacity`; fixed at 4 slots here
    /// (capacity 2) to keep the model small.
    fn new() -> Self {
        Self {
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            threshold: AtomicI64::new(-1),
            draining: AtomicBool::new(false),
            capacity: 2,
            slot_count: 4,
            slots: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            values: UnsafeCell::new([0; 4]),
        }
    }

    fn enqueue(&self, value: u64) -> bool {
        for _ in 0..MAX_ATTEMPTS {
            let tail = self.tail.fetch_add(1, Ordering::Relaxed);
            let idx = (tail % self.slot_count) as usize;
            let expected_cycle = tail / self.slot_count;
            let observed = self.slots[idx].load(Ordering::Acquire);

            if observed == expected_cycle.wrapping_mul(2) {
                unsafe {
                    (*self.values.get())[idx] = value;
                }
                self.slots[idx].store(expected_cycle.wrapping_mul(2) + 1, Ordering::Release);
                return true;
            }
            // Slot not ready for this cycle: a consumer hasn't vacated it
            // yet. Real code repairs the slot in place; the model retries
            // with a fresh claim, which is sufficient to exercise the
            // claim/publish race loom is checking here.
            thread::yield_now();
        }
        false
    }

    fn dequeue(&self) -> Option<u64> {
        for _ in 0..MAX_ATTEMPTS {
            let head = self.head.fetch_add(1, Ordering::Relaxed);
            let idx = (head % self.slot_count) as usize;
            let expected_cycle = head / self.slot_count;
            let observed = self.slots[idx].load(Ordering::Acquire);

            if observed == expected_cycle.wrapping_mul(2) + 1 {
                let value = unsafe { (*self.values.get())[idx] };
                self.slots[idx].store(expected_cycle.wrapping_mul(2) + 2, Ordering::Release);
                return Some(value);
            }
            thread::yield_now();
        }
        None
    }
}

#[test]
fn loom_faa_cycle_two_producers_no_lost_or_duplicated_value() {
    loom::model(|| {
        let ring = Arc::new(LoomFaaCycleRing::new());
        let ring_a = Arc::clone(&ring);
        let ring_b = Arc::clone(&ring);

        let producer_a = thread::spawn(move || ring_a.enqueue(1));
        let producer_b = thread::spawn(move || ring_b.enqueue(2));

        let ok_a = producer_a.join().unwrap();
        let ok_b = producer_b.join().unwrap();

        let mut received = Vec::new();
        while let Some(v) = ring.dequeue() {
            received.push(v);
        }

        assert_eq!(received.len(), ok_a as usize + ok_b as usize);
        let mut sorted = received.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), received.len(), "no value observed twice");
    });
}

#[test]
fn loom_faa_cycle_concurrent_enqueue_dequeue_never_over_delivers() {
    loom::model(|| {
        let ring = Arc::new(LoomFaaCycleRing::new());
        assert!(ring.enqueue(100));

        let producer_ring = Arc::clone(&ring);
        let producer = thread::spawn(move || producer_ring.enqueue(200));

        let consumer_ring = Arc::clone(&ring);
        let consumer = thread::spawn(move || {
            let mut received = Vec::new();
            for _ in 0..MAX_ATTEMPTS {
                if let Some(v) = consumer_ring.dequeue() {
                    received.push(v);
                }
                if received.len() == 2 {
                    break;
                }
            }
            received
        });

        let sent = producer.join().unwrap();
        let received = consumer.join().unwrap();
        assert!(received.len() <= 1 + sent as usize);
    });
}
