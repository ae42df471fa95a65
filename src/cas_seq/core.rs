//! CAS-sequence (Vyukov-style) core: the compact alternative to the
//! FAA-cycle family (`spec.md` §4.5). `n` physical slots back a usable
//! capacity of `n`; each slot carries its own monotone `sequence` number
//! instead of a cycle tag, giving ABA safety without 2n overprovisioning.

use crate::backoff::Backoff;
use crate::invariants::debug_assert_monotonic;
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

struct Slot<T> {
    sequence: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

/// The CAS-sequence core shared by the compact MP/MC, MP/SC and SP/MC
/// variants. Mode-specific wrappers in `cas_seq::mod` pick which of the four
/// methods below apply to each side.
pub(crate) struct CasSeqCore<T> {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    capacity: usize,
    mask: u64,
    slots: Box<[CachePadded<Slot<T>>]>,
}

unsafe impl<T: Send> Send for CasSeqCore<T> {}
unsafe impl<T: Send> Sync for CasSeqCore<T> {}

impl<T: Default> CasSeqCore<T> {
    pub(crate) fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "CAS-sequence queue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);

        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(CachePadded::new(Slot {
                sequence: AtomicU64::new(i as u64),
                value: UnsafeCell::new(MaybeUninit::new(T::default())),
            }));
        }

        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            capacity,
            mask: (capacity - 1) as u64,
            slots: slots.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn slot(&self, index: u64) -> &Slot<T> {
        &self.slots[(index & self.mask) as usize]
    }

    /// Multi-producer enqueue (`spec.md` §4.5, used by MP/MC and MP/SC).
    pub(crate) fn enqueue_mp(&self, item: T) -> Result<(), WouldBlock> {
        let mut backoff = Backoff::new();
        let mut item = Some(item);
        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            let slot = self.slot(tail);
            let sequence = slot.sequence.load(Ordering::Acquire);
            let diff = sequence.wrapping_sub(tail) as i64;

            if diff == 0 {
                if self
                    .tail
                    .compare_exchange_weak(tail, tail + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_monotonic!("cas_seq tail", tail, tail + 1);
                    // SAFETY: the successful CAS on `tail` gives this thread
                    // exclusive ownership of this slot until `sequence` is
                    // republished below.
                    unsafe {
                        *slot.value.get() = MaybeUninit::new(item.take().unwrap());
                    }
                    slot.sequence.store(tail + 1, Ordering::Release);
                    return Ok(());
                }
            } else if diff < 0 {
                return Err(WouldBlock);
            } else {
                backoff.spin();
            }
        }
    }

    /// Single-producer straight-line enqueue (`spec.md` §4.5, used by SP/MC).
    pub(crate) fn enqueue_sp(&self, item: T) -> Result<(), WouldBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = self.slot(tail);
        let sequence = slot.sequence.load(Ordering::Acquire);
        let diff = sequence.wrapping_sub(tail) as i64;
        if diff != 0 {
            return Err(WouldBlock);
        }

        unsafe {
            *slot.value.get() = MaybeUninit::new(item);
        }
        slot.sequence.store(tail + 1, Ordering::Release);
        self.tail.store(tail + 1, Ordering::Release);
        Ok(())
    }

    /// Multi-consumer dequeue (`spec.md` §4.5, used by MP/MC and SP/MC).
    pub(crate) fn dequeue_mc(&self) -> Result<T, WouldBlock> {
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Relaxed);
            let slot = self.slot(head);
            let sequence = slot.sequence.load(Ordering::Acquire);
            let diff = sequence.wrapping_sub(head.wrapping_add(1)) as i64;

            if diff == 0 {
                if self
                    .head
                    .compare_exchange_weak(head, head + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_monotonic!("cas_seq head", head, head + 1);
                    // SAFETY: the successful CAS on `head` gives this thread
                    // exclusive ownership of this slot's current value.
                    let value = unsafe { slot.value.get().read().assume_init() };
                    unsafe {
                        *slot.value.get() = MaybeUninit::new(T::default());
                    }
                    slot.sequence
                        .store(head + self.capacity as u64, Ordering::Release);
                    return Ok(value);
                }
            } else if diff < 0 {
                return Err(WouldBlock);
            } else {
                backoff.spin();
            }
        }
    }

    /// Single-consumer straight-line dequeue (`spec.md` §4.5, used by
    /// MP/SC).
    pub(crate) fn dequeue_sc(&self) -> Result<T, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = self.slot(head);
        let sequence = slot.sequence.load(Ordering::Acquire);
        let diff = sequence.wrapping_sub(head.wrapping_add(1)) as i64;
        if diff != 0 {
            return Err(WouldBlock);
        }

        let value = unsafe { slot.value.get().read().assume_init() };
        unsafe {
            *slot.value.get() = MaybeUninit::new(T::default());
        }
        slot.sequence
            .store(head + self.capacity as u64, Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        Ok(value)
    }
}

impl<T> Drop for CasSeqCore<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        for idx in head..tail {
            let slot = &mut self.slots[(idx & self.mask) as usize];
            let sequence = *slot.sequence.get_mut();
            if sequence == idx + 1 {
                unsafe {
                    std::ptr::drop_in_place(slot.value.get_mut().as_mut_ptr());
                }
            }
        }
    }
}
