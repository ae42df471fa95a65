//! FAA-cycle (SCQ-style) queue family: the default algorithm for MP/MC,
//! MP/SC and SP/MC (`spec.md` §4.3, §4.4). `2n` physical slots back a usable
//! capacity of `n`; a livelock-prevention threshold bounds spurious
//! `WouldBlock` under persistent emptiness, and `drain_mode_on` lets
//! consumers bypass it once producers are known to be done.

mod core;
mod dual_core;

use self::core::FaaCycleCore;
use self::dual_core::DualWordCore;
use crate::WouldBlock;

/// Multi-producer/multi-consumer queue, generic by-value storage.
pub struct MpmcQueue<T>(FaaCycleCore<T>);

impl<T: Default> MpmcQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(FaaCycleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(item, false)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        self.0.dequeue_mc()
    }

    #[inline]
    pub fn drain_mode_on(&self) {
        self.0.drain_mode_on();
    }
}

/// Multi-producer/single-consumer queue, generic by-value storage.
pub struct MpscQueue<T>(FaaCycleCore<T>);

impl<T: Default> MpscQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(FaaCycleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(item, true)
    }

    /// Must only be called from the single consumer thread.
    #[inline]
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        self.0.dequeue_sc()
    }

    /// No-op for this consumer path (`spec.md` §4.4): the straight-line
    /// consumer has no threshold to bypass. Still exposed so callers can
    /// treat every FAA-cycle variant uniformly during shutdown.
    #[inline]
    pub fn drain_mode_on(&self) {
        self.0.drain_mode_on();
    }
}

/// Single-producer/multi-consumer queue, generic by-value storage.
pub struct SpmcQueue<T>(FaaCycleCore<T>);

impl<T: Default> SpmcQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(FaaCycleCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Must only be called from the single producer thread.
    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(item)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        self.0.dequeue_mc()
    }

    #[inline]
    pub fn drain_mode_on(&self) {
        self.0.drain_mode_on();
    }
}

macro_rules! dual_word_queue {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name(DualWordCore);

        impl $name {
            #[must_use]
            pub fn new(requested_capacity: usize) -> Self {
                Self(DualWordCore::new(requested_capacity))
            }

            #[inline]
            #[must_use]
            pub fn capacity(&self) -> usize {
                self.0.capacity()
            }

            #[inline]
            pub fn drain_mode_on(&self) {
                self.0.drain_mode_on();
            }
        }
    };
}

dual_word_queue!(
    MpmcHandleQueue,
    "MP/MC queue over pointer-sized handles, fused `(cycle, value)` 128-bit atomic slots."
);
dual_word_queue!(
    MpscHandleQueue,
    "MP/SC queue over pointer-sized handles, fused `(cycle, value)` 128-bit atomic slots."
);
dual_word_queue!(
    SpmcHandleQueue,
    "SP/MC queue over pointer-sized handles, fused `(cycle, value)` 128-bit atomic slots."
);

impl MpmcHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value, false)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

impl MpscHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value, true)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_sc()
    }
}

impl SpmcHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

dual_word_queue!(
    MpmcPointerQueue,
    "MP/MC queue over opaque raw pointers, fused `(cycle, value)` 128-bit atomic slots."
);
dual_word_queue!(
    MpscPointerQueue,
    "MP/SC queue over opaque raw pointers, fused `(cycle, value)` 128-bit atomic slots."
);
dual_word_queue!(
    SpmcPointerQueue,
    "SP/MC queue over opaque raw pointers, fused `(cycle, value)` 128-bit atomic slots."
);

impl MpmcPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(ptr as u64, false)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_mc().map(|v| v as usize as *mut ())
    }
}

impl MpscPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(ptr as u64, true)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_sc().map(|v| v as usize as *mut ())
    }
}

impl SpmcPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(ptr as u64)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_mc().map(|v| v as usize as *mut ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpmc_full_empty() {
        let q = MpmcQueue::<i32>::new(8);
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
    fn mpmc_threshold_exhaustion_bounded() {
        let q = MpmcQueue::<i32>::new(4);
        for i in 0..4 {
            assert!(q.enqueue(i).is_ok());
        }
        for i in 0..4 {
            assert_eq!(q.dequeue(), Ok(i));
        }
        for _ in 0..12 {
            assert_eq!(q.dequeue(), Err(WouldBlock));
        }
    }

    #[test]
    fn mpmc_wrap_around() {
        let q = MpmcQueue::<i32>::new(4);
        for round in 0..10 {
            for i in 0..4 {
                assert!(q.enqueue(round * 100 + i).is_ok());
            }
            for i in 0..4 {
                assert_eq!(q.dequeue(), Ok(round * 100 + i));
            }
        }
    }

    #[test]
    fn mpsc_preserves_per_producer_order() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(MpscQueue::<(u8, u32)>::new(64));
        let mut producers = Vec::new();
        const N: u32 = 2_000;
        for p in 0..4u8 {
            let q = Arc::clone(&q);
            producers.push(thread::spawn(move || {
                let mut sent = 0u32;
                while sent < N {
                    if q.enqueue((p, sent)).is_ok() {
                        sent += 1;
                    }
                }
            }));
        }

        let mut last = [None; 4];
        let mut total = 0u32;
        while total < N * 4 {
            if let Ok((p, v)) = q.dequeue() {
                if let Some(prev) = last[p as usize] {
                    assert!(v > prev);
                }
                last[p as usize] = Some(v);
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

        let q = Arc::new(SpmcQueue::<u32>::new(64));
        const N: u32 = 4_000;
        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            let mut sent = 0u32;
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

    #[test]
    fn drain_mode_is_idempotent_and_drains() {
        let q = MpmcQueue::<i32>::new(8);
        for i in 0..8 {
            assert!(q.enqueue(i).is_ok());
        }
        q.drain_mode_on();
        q.drain_mode_on();
        for i in 0..8 {
            assert_eq!(q.dequeue(), Ok(i));
        }
        assert_eq!(q.dequeue(), Err(WouldBlock));
    }

    #[test]
    fn handle_zero_and_max_round_trip() {
        let q = MpmcHandleQueue::new(4);
        assert!(q.enqueue(0).is_ok());
        assert!(q.enqueue(u64::MAX).is_ok());
        assert_eq!(q.dequeue(), Ok(0));
        assert_eq!(q.dequeue(), Ok(u64::MAX));
    }

    #[test]
    fn pointer_bit_pattern_round_trips() {
        let q = MpmcPointerQueue::new(4);
        let mut x = 7u32;
        let ptr = std::ptr::addr_of_mut!(x).cast::<()>();
        assert!(q.enqueue(ptr).is_ok());
        assert_eq!(q.dequeue(), Ok(ptr));
    }

    #[test]
    fn cross_variant_sequential_consistency() {
        let q = MpmcQueue::<i32>::new(8);
        for i in 0..8 {
            assert!(q.enqueue(i).is_ok());
        }
        for i in 0..8 {
            assert_eq!(q.dequeue(), Ok(i));
        }

        let q = MpscQueue::<i32>::new(8);
        for i in 0..8 {
            assert!(q.enqueue(i).is_ok());
        }
        for i in 0..8 {
            assert_eq!(q.dequeue(), Ok(i));
        }

        let q = SpmcQueue::<i32>::new(8);
        for i in 0..8 {
            assert!(q.enqueue(i).is_ok());
        }
        for i in 0..8 {
            assert_eq!(q.dequeue(), Ok(i));
        }
    }
}
