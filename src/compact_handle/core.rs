//! Compact single-word handle queue (`spec.md` §4.6): each slot is one
//! 64-bit atomic, interpreted either as a stored value (high bit clear) or
//! an empty marker (high bit set, low 63 bits a round number). This folds
//! the FAA-cycle/CAS-sequence slot's generation tag and payload into a
//! single word at the cost of restricting legal values to 63 bits.

use crate::backoff::Backoff;
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use std::sync::atomic::{AtomicU64, Ordering};

const EMPTY_FLAG: u64 = 1 << 63;
const ROUND_MASK: u64 = EMPTY_FLAG - 1;

#[inline]
fn empty_marker(round: u64) -> u64 {
    EMPTY_FLAG | (round & ROUND_MASK)
}

/// The compact handle core shared by the MP/MC, MP/SC and SP/MC
/// specializations. Mode-specific wrappers in `compact_handle::mod` pick
/// which of the four methods below apply to each side.
pub(crate) struct CompactHandleCore {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    capacity: usize,
    mask: u64,
    order: u32,
    slots: Box<[CachePadded<AtomicU64>]>,
}

impl CompactHandleCore {
    pub(crate) fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "compact handle queue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);
        let order = capacity.trailing_zeros();

        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(CachePadded::new(AtomicU64::new(empty_marker(0))));
        }

        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            capacity,
            mask: (capacity - 1) as u64,
            order,
            slots: slots.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn round(&self, k: u64) -> u64 {
        (k >> self.order) & ROUND_MASK
    }

    #[inline]
    fn slot(&self, index: u64) -> &AtomicU64 {
        &self.slots[(index & self.mask) as usize]
    }

    #[inline]
    fn check_legal_value(value: u64) {
        assert!(
            value & EMPTY_FLAG == 0,
            "compact handle queue value must fit in 63 bits, got {value:#x}"
        );
    }

    /// Multi-producer enqueue (`spec.md` §4.6, used by MP/MC and MP/SC).
    pub(crate) fn enqueue_mp(&self, value: u64) -> Result<(), WouldBlock> {
        Self::check_legal_value(value);
        let mut backoff = Backoff::new();
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            if tail >= head + self.capacity as u64 {
                return Err(WouldBlock);
            }

            let expected = empty_marker(self.round(tail));
            let result = self.slot(tail).compare_exchange(
                expected,
                value,
                Ordering::Release,
                Ordering::Relaxed,
            );
            // Help-advance `tail` regardless of outcome: on success it is
            // this producer's own publish; on failure it absorbs whichever
            // competitor actually won the slot.
            let _ = self
                .tail
                .compare_exchange(tail, tail + 1, Ordering::Release, Ordering::Relaxed);
            if result.is_ok() {
                return Ok(());
            }
            backoff.spin();
        }
    }

    /// Single-producer straight-line enqueue (`spec.md` §4.6 + SPEC_FULL.md
    /// specialization, used by SP/MC): no competitor can hold this slot, so
    /// a plain load+store replaces the CAS.
    pub(crate) fn enqueue_sp(&self, value: u64) -> Result<(), WouldBlock> {
        Self::check_legal_value(value);
        let tail = self.tail.load(Ordering::Relaxed);
        let expected = empty_marker(self.round(tail));
        if self.slot(tail).load(Ordering::Acquire) != expected {
            return Err(WouldBlock);
        }

        self.slot(tail).store(value, Ordering::Release);
        self.tail.store(tail + 1, Ordering::Release);
        Ok(())
    }

    /// Multi-consumer dequeue (`spec.md` §4.6, used by MP/MC and SP/MC).
    pub(crate) fn dequeue_mc(&self) -> Result<u64, WouldBlock> {
        let mut backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            let observed = self.slot(head).load(Ordering::Acquire);
            if self.head.load(Ordering::Acquire) != head {
                continue;
            }
            if head >= tail {
                return Err(WouldBlock);
            }

            let next_empty = empty_marker((self.round(head) + 1) & ROUND_MASK);
            if observed == next_empty {
                let _ = self.head.compare_exchange(
                    head,
                    head + 1,
                    Ordering::Release,
                    Ordering::Relaxed,
                );
                continue;
            }
            if observed & EMPTY_FLAG != 0 {
                backoff.spin();
                continue;
            }

            let result = self.slot(head).compare_exchange(
                observed,
                next_empty,
                Ordering::Release,
                Ordering::Relaxed,
            );
            let _ = self
                .head
                .compare_exchange(head, head + 1, Ordering::Release, Ordering::Relaxed);
            match result {
                Ok(_) => return Ok(observed),
                Err(_) => continue,
            }
        }
    }

    /// Single-consumer straight-line dequeue (`spec.md` §4.6 + SPEC_FULL.md
    /// specialization, used by MP/SC).
    pub(crate) fn dequeue_sc(&self) -> Result<u64, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            return Err(WouldBlock);
        }

        let observed = self.slot(head).load(Ordering::Acquire);
        let next_empty = empty_marker((self.round(head) + 1) & ROUND_MASK);
        self.slot(head).store(next_empty, Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        Ok(observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_bit_value_aborts() {
        let core = CompactHandleCore::new(4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            core.enqueue_mp(1 << 63)
        }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_is_a_legal_distinct_value() {
        let core = CompactHandleCore::new(4);
        assert!(core.enqueue_mp(0).is_ok());
        assert_eq!(core.dequeue_mc(), Ok(0));
    }

    #[test]
    fn basic_fifo() {
        let core = CompactHandleCore::new(4);
        for i in 0..4 {
            assert!(core.enqueue_mp(i).is_ok());
        }
        assert_eq!(core.enqueue_mp(99), Err(WouldBlock));
        for i in 0..4 {
            assert_eq!(core.dequeue_mc(), Ok(i));
        }
        assert_eq!(core.dequeue_mc(), Err(WouldBlock));
    }

    #[test]
    fn wraps_through_several_rounds() {
        let core = CompactHandleCore::new(4);
        for round in 0..20u64 {
            for i in 0..4 {
                assert!(core.enqueue_mp(round * 10 + i).is_ok());
            }
            for i in 0..4 {
                assert_eq!(core.dequeue_mc(), Ok(round * 10 + i));
            }
        }
    }

    #[test]
    fn single_sided_paths() {
        let core = CompactHandleCore::new(4);
        for i in 0..4 {
            assert!(core.enqueue_sp(i).is_ok());
        }
        for i in 0..4 {
            assert_eq!(core.dequeue_sc(), Ok(i));
        }
    }
}
