use crate::invariants::{debug_assert_monotonic, debug_assert_valid_capacity};
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

/// Single-producer/single-consumer ring with cached indices (Lamport).
///
/// Wait-free: both `enqueue` and `dequeue` complete in O(1) with at most one
/// atomic acquire-load on the cache-miss path and one atomic release-store on
/// success. In steady state — a producer that is not chasing the consumer,
/// and vice versa — neither side ever touches the other's atomic at all.
///
/// # Access discipline
///
/// Exactly one thread may call `enqueue` at a time, and exactly one thread
/// (which may differ from the producer thread) may call `dequeue` at a time.
/// This is a caller contract, not something the type enforces structurally;
/// violating it is a data race.
#[repr(C)]
pub struct SpscQueue<T> {
    // Producer-hot: written by the producer, read by the consumer.
    tail: CachePadded<AtomicU64>,
    // Producer-owned cache of the consumer's head; single-writer.
    cached_head: CachePadded<UnsafeCell<u64>>,

    // Consumer-hot: written by the consumer, read by the producer.
    head: CachePadded<AtomicU64>,
    // Consumer-owned cache of the producer's tail; single-writer.
    cached_tail: CachePadded<UnsafeCell<u64>>,

    mask: u64,
    capacity: usize,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T: Default> SpscQueue<T> {
    /// Constructs a queue whose usable capacity is the next power of two
    /// `>= requested_capacity`. Aborts if `requested_capacity < 2`.
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "SpscQueue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);
        debug_assert_valid_capacity!(capacity);

        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || UnsafeCell::new(MaybeUninit::new(T::default())));

        Self {
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
            mask: (capacity - 1) as u64,
            capacity,
            buffer: buffer.into_boxed_slice(),
        }
    }

    /// The rounded-up capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueues `item`. Returns `WouldBlock` if the ring is full.
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        let tail = self.tail.load(Ordering::Relaxed);

        // SAFETY: cached_head is written only by the producer, which is the
        // sole caller of this method per the access discipline.
        let mut cached_head = unsafe { *self.cached_head.get() };

        if tail.wrapping_sub(cached_head) > self.mask {
            // Cache looks full; refresh from the consumer's real head.
            cached_head = self.head.load(Ordering::Acquire);
            unsafe { *self.cached_head.get() = cached_head };

            if tail.wrapping_sub(cached_head) > self.mask {
                return Err(WouldBlock);
            }
        }

        let idx = (tail & self.mask) as usize;
        // SAFETY: this slot is not owned by the consumer: it lies in
        // [cached_head, cached_head + capacity), which the acquire-load
        // above has just confirmed is ahead of the true head.
        unsafe {
            *self.buffer[idx].get() = MaybeUninit::new(item);
        }

        let new_tail = tail.wrapping_add(1);
        debug_assert_monotonic!("tail", tail, new_tail);
        self.tail.store(new_tail, Ordering::Release);
        Ok(())
    }

    /// Dequeues the oldest element. Returns `WouldBlock` if the ring is empty.
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);

        // SAFETY: cached_tail is written only by the consumer, which is the
        // sole caller of this method per the access discipline.
        let mut cached_tail = unsafe { *self.cached_tail.get() };

        if head >= cached_tail {
            cached_tail = self.tail.load(Ordering::Acquire);
            unsafe { *self.cached_tail.get() = cached_tail };

            if head >= cached_tail {
                return Err(WouldBlock);
            }
        }

        let idx = (head & self.mask) as usize;
        // SAFETY: slots in [head, cached_tail) were published by the
        // producer's release-store of tail, synchronized above.
        let item = unsafe {
            let slot = &mut *self.buffer[idx].get();
            std::mem::replace(slot, MaybeUninit::new(T::default())).assume_init()
        };

        let new_head = head.wrapping_add(1);
        debug_assert_monotonic!("head", head, new_head);
        self.head.store(new_head, Ordering::Release);
        Ok(item)
    }
}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let count = tail.wrapping_sub(head) as usize;
        for i in 0..count {
            let idx = ((head.wrapping_add(i as u64)) & self.mask) as usize;
            unsafe {
                std::ptr::drop_in_place(self.buffer[idx].get_mut().as_mut_ptr());
            }
        }
    }
}
