//! CAS-sequence core specialized to the 128-bit dual-word slot (`spec.md`
//! §3, §4.5): `sequence` and `value` fused into one atomic, so a producer's
//! publish is a single CAS on the slot itself rather than a CAS on `tail`
//! followed by a plain store of `value`. After winning the slot CAS, the
//! producer helps advance the shared `tail`/`head` counter so a losing
//! competitor's next read of it is never stale for long.
//!
//! Layout: low 64 bits hold `sequence`, high 64 bits hold `value`.

use crate::backoff::Backoff;
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use portable_atomic::{AtomicU128, AtomicU64, Ordering};

#[inline]
fn pack(sequence: u64, value: u64) -> u128 {
    ((value as u128) << 64) | sequence as u128
}

#[inline]
fn unpack(word: u128) -> (u64, u64) {
    (word as u64, (word >> 64) as u64)
}

struct DualSlot(AtomicU128);

pub(crate) struct DualCasSeqCore {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    capacity: usize,
    mask: u64,
    slots: Box<[CachePadded<DualSlot>]>,
}

unsafe impl Send for DualCasSeqCore {}
unsafe impl Sync for DualCasSeqCore {}

impl DualCasSeqCore {
    pub(crate) fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "CAS-sequence dual-word queue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);

        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(CachePadded::new(DualSlot(AtomicU128::new(pack(i as u64, 0)))));
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
    fn slot(&self, index: u64) -> &DualSlot {
        &self.slots[(index & self.mask) as usize]
    }

    pub(crate) fn enqueue_mp(&self, item: u64) -> Result<(), WouldBlock> {
        let mut backoff = Backoff::new();
        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            let slot = self.slot(tail);
            let word = slot.0.load(Ordering::Acquire);
            let (sequence, _) = unpack(word);
            let diff = sequence.wrapping_sub(tail) as i64;

            if diff == 0 {
                let new_word = pack(tail + 1, item);
                if slot
                    .0
                    .compare_exchange(word, new_word, Ordering::Release, Ordering::Relaxed)
                    .is_ok()
                {
                    let _ = self.tail.compare_exchange(
                        tail,
                        tail + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    );
                    return Ok(());
                }
            } else if diff < 0 {
                return Err(WouldBlock);
            } else {
                backoff.spin();
            }
        }
    }

    pub(crate) fn enqueue_sp(&self, item: u64) -> Result<(), WouldBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = self.slot(tail);
        let word = slot.0.load(Ordering::Acquire);
        let (sequence, _) = unpack(word);
        if sequence.wrapping_sub(tail) as i64 != 0 {
            return Err(WouldBlock);
        }

        slot.0.store(pack(tail + 1, item), Ordering::Release);
        self.tail.store(tail + 1, Ordering::Release);
        Ok(())
    }

    pub(crate) fn dequeue_mc(&self) -> Result<u64, WouldBlock> {
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Relaxed);
            let slot = self.slot(head);
            let word = slot.0.load(Ordering::Acquire);
            let (sequence, value) = unpack(word);
            let diff = sequence.wrapping_sub(head.wrapping_add(1)) as i64;

            if diff == 0 {
                let new_word = pack(head + self.capacity as u64, 0);
                if slot
                    .0
                    .compare_exchange(word, new_word, Ordering::Release, Ordering::Relaxed)
                    .is_ok()
                {
                    let _ = self.head.compare_exchange(
                        head,
                        head + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    );
                    return Ok(value);
                }
            } else if diff < 0 {
                return Err(WouldBlock);
            } else {
                backoff.spin();
            }
        }
    }

    pub(crate) fn dequeue_sc(&self) -> Result<u64, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = self.slot(head);
        let word = slot.0.load(Ordering::Acquire);
        let (sequence, value) = unpack(word);
        if sequence.wrapping_sub(head.wrapping_add(1)) as i64 != 0 {
            return Err(WouldBlock);
        }

        slot.0
            .store(pack(head + self.capacity as u64, 0), Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        Ok(value)
    }
}
