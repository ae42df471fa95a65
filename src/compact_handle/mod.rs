//! Compact single-word MP/MC, MP/SC and SP/MC handle queues (`spec.md` §4.6,
//! specialized per `SPEC_FULL.md`). Exclusive to the handle storage flavor:
//! values are restricted to 63 bits, so there is no generic or pointer
//! variant of this family.

mod core;

use self::core::CompactHandleCore;
use crate::WouldBlock;

/// Multi-producer/multi-consumer compact handle queue.
pub struct CompactMpmcHandleQueue(CompactHandleCore);

impl CompactMpmcHandleQueue {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CompactHandleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

/// Multi-producer/single-consumer compact handle queue.
pub struct CompactMpscHandleQueue(CompactHandleCore);

impl CompactMpscHandleQueue {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CompactHandleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value)
    }

    /// Must only be called from the single consumer thread.
    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_sc()
    }
}

/// Single-producer/multi-consumer compact handle queue.
pub struct CompactSpmcHandleQueue(CompactHandleCore);

impl CompactSpmcHandleQueue {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CompactHandleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Must only be called from the single producer thread.
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpmc_full_empty() {
        let q = CompactMpmcHandleQueue::new(8);
        for i in 0..8 {
            assert!(q.enqueue(i).is_ok());
        }
        assert_eq!(q.enqueue(999), Err(WouldBlock));
        for i in 0..8 {
            assert_eq!(q.dequeue(), Ok(i));
        }
        assert_eq!(q.dequeue(), Err(WouldBlock));
    }

    #[test]
    fn mpsc_preserves_per_producer_order() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(CompactMpscHandleQueue::new(64));
        let mut producers = Vec::new();
        const N: u64 = 2_000;
        for p in 0..4u64 {
            let q = Arc::clone(&q);
            producers.push(thread::spawn(move || {
                let mut sent = 0u64;
                while sent < N {
                    // Pack producer id into the top 8 of the 63 legal bits
                    // so the single consumer can check per-producer order.
                    if q.enqueue((p << 32) | sent).is_ok() {
                        sent += 1;
                    }
                }
            }));
        }

        let mut last = [None; 4];
        let mut total = 0u64;
        while total < N * 4 {
            if let Ok(word) = q.dequeue() {
                let p = (word >> 32) as usize;
                let v = word & 0xFFFF_FFFF;
                if let Some(prev) = last[p] {
                    assert!(v > prev);
                }
                last[p] = Some(v);
                total += 1;
            }
        }
        for p in producers {
            p.join().unwrap();
        }
    }

    #[test]
    fn spmc_multiset_equals_enqueued() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(CompactSpmcHandleQueue::new(64));
        const N: u64 = 4_000;
        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            let mut sent = 0u64;
            while sent < N {
                if producer_q.enqueue(sent).is_ok() {
                    sent += 1;
                }
            }
        });

        let total = Arc::new(AtomicUsize::new(0));
        let mut consumers = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&q);
            let total = Arc::clone(&total);
            consumers.push(thread::spawn(move || {
                let mut count = 0usize;
                loop {
                    match q.dequeue() {
                        Ok(_) => count += 1,
                        Err(WouldBlock) => {
                            if total.load(Ordering::Acquire) + count >= N as usize {
                                break;
                            }
                        }
                    }
                }
                total.fetch_add(count, Ordering::AcqRel);
            }));
        }
        producer.join().unwrap();
        for c in consumers {
            let _ = c.join();
        }
    }
}
