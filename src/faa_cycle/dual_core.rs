//! FAA-cycle core specialized to the 128-bit dual-word slot (`spec.md` §3,
//! §9): `cycle` and `value` fused into one atomic so a slot's generation tag
//! and payload publish in a single CAS instead of a write-then-cycle-store
//! pair. Used by the handle and pointer storage flavors, where the payload is
//! always a plain `u64` (a handle, or a pointer's bit pattern).
//!
//! Layout: low 64 bits hold `cycle`, high 64 bits hold `value`.

use crate::backoff::Backoff;
use crate::invariants::{debug_assert_cycle_match, debug_assert_threshold_bounded};
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use portable_atomic::{AtomicBool, AtomicI64, AtomicU128, AtomicU64, Ordering};

#[inline]
fn pack(cycle: u64, value: u64) -> u128 {
    ((value as u128) << 64) | cycle as u128
}

#[inline]
fn unpack(word: u128) -> (u64, u64) {
    (word as u64, (word >> 64) as u64)
}

/// One physical dual-word slot: `(cycle, value)` fused into one `AtomicU128`.
struct DualSlot(AtomicU128);

pub(crate) struct DualWordCore {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    threshold: CachePadded<AtomicI64>,
    draining: CachePadded<AtomicBool>,
    capacity: usize,
    mask: u64,
    slots: Box<[CachePadded<DualSlot>]>,
}

unsafe impl Send for DualWordCore {}
unsafe impl Sync for DualWordCore {}

impl DualWordCore {
    pub(crate) fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "FAA-cycle dual-word queue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);
        let physical = capacity * 2;

        let mut slots = Vec::with_capacity(physical);
        for i in 0..physical {
            let cycle = (i / capacity) as u64;
            slots.push(CachePadded::new(DualSlot(AtomicU128::new(pack(cycle, 0)))));
        }

        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            threshold: CachePadded::new(AtomicI64::new(3 * capacity as i64 - 1)),
            draining: CachePadded::new(AtomicBool::new(false)),
            capacity,
            mask: (physical - 1) as u64,
            slots: slots.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn drain_mode_on(&self) {
        self.draining.store(true, Ordering::Release);
    }

    #[inline]
    fn slot(&self, index: u64) -> &DualSlot {
        &self.slots[(index & self.mask) as usize]
    }

    fn reset_threshold(&self) {
        self.threshold
            .store(3 * self.capacity as i64 - 1, Ordering::Relaxed);
    }

    /// Mirrors [`super::core::FaaCycleCore::enqueue_mp`], but the write of
    /// `value` and the publish of `cycle` happen as one CAS on the fused
    /// word, so there is no intermediate state where `cycle` is published
    /// without `value`.
    pub(crate) fn enqueue_mp(&self, item: u64, repair_on_stale: bool) -> Result<(), WouldBlock> {
        let mut backoff = Backoff::new();
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            if tail >= head + self.capacity as u64 {
                return Err(WouldBlock);
            }

            let my_tail = self.tail.fetch_add(1, Ordering::AcqRel);
            let slot = self.slot(my_tail);
            let expected_cycle = my_tail / self.capacity as u64;

            let word = slot.0.load(Ordering::Acquire);
            let (cycle, _) = unpack(word);
            if cycle == expected_cycle {
                let new_word = pack(expected_cycle + 1, item);
                match slot.0.compare_exchange(
                    word,
                    new_word,
                    Ordering::Release,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        self.reset_threshold();
                        return Ok(());
                    }
                    Err(_) => continue,
                }
            } else if cycle < expected_cycle {
                if repair_on_stale {
                    let (_, value) = unpack(word);
                    let _ = slot.0.compare_exchange(
                        word,
                        pack(expected_cycle + 1, value),
                        Ordering::Release,
                        Ordering::Relaxed,
                    );
                    backoff.spin();
                    continue;
                }
                return Err(WouldBlock);
            } else {
                backoff.spin();
            }
        }
    }

    /// Mirrors [`super::core::FaaCycleCore::enqueue_sp`].
    pub(crate) fn enqueue_sp(&self, item: u64) -> Result<(), WouldBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = self.slot(tail);
        let expected_cycle = tail / self.capacity as u64;

        let word = slot.0.load(Ordering::Acquire);
        let (cycle, _) = unpack(word);
        if cycle != expected_cycle {
            return Err(WouldBlock);
        }

        slot.0
            .store(pack(expected_cycle + 1, item), Ordering::Release);
        self.tail.store(tail + 1, Ordering::Release);
        self.reset_threshold();
        Ok(())
    }

    /// Mirrors [`super::core::FaaCycleCore::dequeue_mc`].
    pub(crate) fn dequeue_mc(&self) -> Result<u64, WouldBlock> {
        if !self.draining.load(Ordering::Acquire) && self.threshold.load(Ordering::Relaxed) < 0 {
            return Err(WouldBlock);
        }

        let mut backoff = Backoff::new();
        loop {
            let my_head = self.head.fetch_add(1, Ordering::AcqRel);
            let slot = self.slot(my_head);
            let expected_cycle = my_head / self.capacity as u64 + 1;

            let word = slot.0.load(Ordering::Acquire);
            let (cycle, value) = unpack(word);
            if cycle == expected_cycle {
                debug_assert_cycle_match!(cycle, expected_cycle);
                let new_cycle = (my_head + 2 * self.capacity as u64) / self.capacity as u64;
                match slot.0.compare_exchange(
                    word,
                    pack(new_cycle, 0),
                    Ordering::Release,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => return Ok(value),
                    Err(_) => unreachable!(
                        "a slot exclusively claimed via fetch_add cannot be raced"
                    ),
                }
            } else if cycle < expected_cycle {
                let repaired_cycle = (my_head + 2 * self.capacity as u64) / self.capacity as u64;
                let _ = slot.0.compare_exchange(
                    word,
                    pack(repaired_cycle, value),
                    Ordering::Release,
                    Ordering::Relaxed,
                );

                let tail_now = self.tail.load(Ordering::Acquire);
                if tail_now <= my_head + 1 {
                    self.catch_up_tail(my_head + 1);
                    self.threshold.fetch_sub(1, Ordering::Relaxed);
                    return Err(WouldBlock);
                }

                let new_threshold = self.threshold.fetch_sub(1, Ordering::Relaxed) - 1;
                debug_assert_threshold_bounded!(new_threshold, self.capacity);
                if new_threshold <= 0 && !self.draining.load(Ordering::Acquire) {
                    return Err(WouldBlock);
                }
            } else {
                backoff.spin();
            }
        }
    }

    /// Mirrors [`super::core::FaaCycleCore::dequeue_sc`].
    pub(crate) fn dequeue_sc(&self) -> Result<u64, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = self.slot(head);
        let expected_cycle = head / self.capacity as u64 + 1;

        let word = slot.0.load(Ordering::Acquire);
        let (cycle, value) = unpack(word);
        if cycle != expected_cycle {
            return Err(WouldBlock);
        }

        let new_cycle = (head + 2 * self.capacity as u64) / self.capacity as u64;
        slot.0.store(pack(new_cycle, 0), Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        Ok(value)
    }

    fn catch_up_tail(&self, target: u64) {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if tail >= target {
                return;
            }
            if self
                .tail
                .compare_exchange(tail, target, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }
}
