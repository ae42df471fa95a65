use crate::backoff::Backoff;
use crate::invariants::{
    debug_assert_cycle_match, debug_assert_head_not_past_tail, debug_assert_threshold_bounded,
};
use crate::padding::CachePadded;
use crate::{round_up_capacity, WouldBlock};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// One physical slot of the FAA-cycle ring: a generation tag (`cycle`) plus
/// the element storage, laid out on its own cache line.
///
/// `cycle == producer_index / capacity + 1` iff the slot currently holds
/// data written for that producer index (`spec.md` §3, §4.7).
struct Slot<T> {
    cycle: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: access to `value` is always gated by a successful CAS/store on
// `cycle`, which is the synchronizing atomic; at most one thread has write
// access to a slot's value at a time under the protocol in `spec.md` §4.3.
unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

/// The FAA-cycle (SCQ-style) core shared by the default MP/MC, MP/SC and
/// SP/MC variants. `2 * capacity` physical slots back a usable capacity of
/// `capacity`. Mode-specific wrappers in `faa_cycle::mod` pick which of the
/// four methods below (`enqueue_mp`/`enqueue_sp`, `dequeue_mc`/`dequeue_sc`)
/// apply to each side.
pub(crate) struct FaaCycleCore<T> {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    threshold: CachePadded<AtomicI64>,
    draining: CachePadded<AtomicBool>,
    capacity: usize,
    mask: u64,
    slots: Box<[CachePadded<Slot<T>>]>,
}

unsafe impl<T: Send> Send for FaaCycleCore<T> {}
unsafe impl<T: Send> Sync for FaaCycleCore<T> {}

impl<T: Default> FaaCycleCore<T> {
    pub(crate) fn new(requested_capacity: usize) -> Self {
        assert!(
            requested_capacity >= 2,
            "FAA-cycle queue capacity must be >= 2, got {requested_capacity}"
        );
        let capacity = round_up_capacity(requested_capacity);
        let physical = capacity * 2;

        let mut slots = Vec::with_capacity(physical);
        for i in 0..physical {
            slots.push(CachePadded::new(Slot {
                cycle: AtomicU64::new((i / capacity) as u64),
                value: UnsafeCell::new(MaybeUninit::new(T::default())),
            }));
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
    fn slot(&self, index: u64) -> &Slot<T> {
        &self.slots[(index & self.mask) as usize]
    }

    fn reset_threshold(&self) {
        self.threshold
            .store(3 * self.capacity as i64 - 1, Ordering::Relaxed);
    }

    /// Multi-producer enqueue path (`spec.md` §4.3, used by MP/MC and MP/SC).
    ///
    /// `repair_on_stale` replicates the MP/SC-specific behavior in §4.4: when
    /// there is no multi-consumer repair mechanism on the other side (the
    /// sole consumer in MP/SC uses the straight-line [`dequeue_sc`]), a
    /// producer that discovers a never-filled stale slot repairs it forward
    /// so the consumer is not stuck waiting on a position that will never
    /// be written. MP/MC producers (`repair_on_stale = false`) instead treat
    /// a stale slot as a genuine full condition, matching §4.3 step 5
    /// verbatim.
    pub(crate) fn enqueue_mp(&self, item: T, repair_on_stale: bool) -> Result<(), WouldBlock> {
        let mut backoff = Backoff::new();
        let mut item = Some(item);
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);
            debug_assert_head_not_past_tail!(head, tail);
            if tail >= head + self.capacity as u64 {
                return Err(WouldBlock);
            }

            let my_tail = self.tail.fetch_add(1, Ordering::AcqRel);
            let slot = self.slot(my_tail);
            let expected_cycle = my_tail / self.capacity as u64;

            let cycle = slot.cycle.load(Ordering::Acquire);
            if cycle == expected_cycle {
                // SAFETY: this slot is in PRODUCER_WRITABLE(expected_cycle);
                // no consumer can observe it until the cycle CAS below
                // publishes CONSUMER_READABLE(expected_cycle).
                unsafe {
                    *slot.value.get() = MaybeUninit::new(item.take().unwrap());
                }
                if slot
                    .cycle
                    .compare_exchange(
                        expected_cycle,
                        expected_cycle + 1,
                        Ordering::Release,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    self.reset_threshold();
                    return Ok(());
                }
                // This CAS can genuinely fail: a concurrent `dequeue_mc` can
                // reach this same physical slot (whenever its `my_head`
                // lands on the same index as `my_tail`, which its
                // unconditional `fetch_add` can always do) and repair the
                // slot's cycle on the `cycle < expected_cycle` branch below
                // before this CAS runs. There is no retry of this CAS: we
                // fall out of the if/else-if/else and loop back to a fresh
                // `fetch_add` on `tail`, abandoning this slot entirely and
                // carrying the item forward to publish under a new claim.
                item = Some(unsafe { slot.value.get().read().assume_init() });
            } else if cycle < expected_cycle {
                if repair_on_stale {
                    let _ = slot.cycle.compare_exchange(
                        cycle,
                        expected_cycle + 1,
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

    /// Single-producer straight-line enqueue (`spec.md` §4.4, used by SP/MC).
    pub(crate) fn enqueue_sp(&self, item: T) -> Result<(), WouldBlock> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = self.slot(tail);
        let expected_cycle = tail / self.capacity as u64;

        let cycle = slot.cycle.load(Ordering::Acquire);
        if cycle != expected_cycle {
            return Err(WouldBlock);
        }

        unsafe {
            *slot.value.get() = MaybeUninit::new(item);
        }
        slot.cycle.store(expected_cycle + 1, Ordering::Release);
        self.tail.store(tail + 1, Ordering::Release);
        self.reset_threshold();
        Ok(())
    }

    /// Multi-consumer dequeue path (`spec.md` §4.3, used by MP/MC and SP/MC),
    /// gated by the livelock-prevention threshold and `drain_mode_on`.
    pub(crate) fn dequeue_mc(&self) -> Result<T, WouldBlock> {
        if !self.draining.load(Ordering::Acquire) && self.threshold.load(Ordering::Relaxed) < 0 {
            return Err(WouldBlock);
        }

        let mut backoff = Backoff::new();
        loop {
            let my_head = self.head.fetch_add(1, Ordering::AcqRel);
            let slot = self.slot(my_head);
            let expected_cycle = my_head / self.capacity as u64 + 1;

            let cycle = slot.cycle.load(Ordering::Acquire);
            if cycle == expected_cycle {
                debug_assert_cycle_match!(cycle, expected_cycle);
                // SAFETY: cycle == expected_cycle means the producer fully
                // published this slot's value before the cycle store.
                let value = unsafe { slot.value.get().read().assume_init() };
                let new_cycle = (my_head + 2 * self.capacity as u64) / self.capacity as u64;
                loop {
                    match slot.cycle.compare_exchange(
                        expected_cycle,
                        new_cycle,
                        Ordering::Release,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            unsafe {
                                *slot.value.get() = MaybeUninit::new(T::default());
                            }
                            return Ok(value);
                        }
                        Err(observed) if observed == expected_cycle => continue,
                        Err(_) => unreachable!(
                            "a slot exclusively claimed via fetch_add cannot be raced"
                        ),
                    }
                }
            } else if cycle < expected_cycle {
                // Producer has not yet filled this generation: repair so a
                // future producer can advance past it (best effort; ignore
                // the outcome, another dequeuer may have repaired first).
                let repaired_cycle = (my_head + 2 * self.capacity as u64) / self.capacity as u64;
                let _ = slot.cycle.compare_exchange(
                    cycle,
                    repaired_cycle,
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
                // Otherwise keep trying: claim a fresh head.
            } else {
                backoff.spin();
            }
        }
    }

    /// Single-consumer straight-line dequeue (`spec.md` §4.4, used by
    /// MP/SC). No threshold or drain gating is needed: the sole consumer
    /// owns `head` exclusively, so an unfilled slot simply means "empty".
    pub(crate) fn dequeue_sc(&self) -> Result<T, WouldBlock> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = self.slot(head);
        let expected_cycle = head / self.capacity as u64 + 1;

        let cycle = slot.cycle.load(Ordering::Acquire);
        if cycle != expected_cycle {
            return Err(WouldBlock);
        }

        // SAFETY: cycle == expected_cycle means the producer fully
        // published this slot's value before the cycle store.
        let value = unsafe { slot.value.get().read().assume_init() };
        unsafe {
            *slot.value.get() = MaybeUninit::new(T::default());
        }
        let new_cycle = (head + 2 * self.capacity as u64) / self.capacity as u64;
        slot.cycle.store(new_cycle, Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        Ok(value)
    }

    /// Converges `tail` to at least `target` after an empty-skip. A
    /// convergence helper, not a correctness requirement for any single
    /// dequeue — retained per `spec.md` §9 because omitting it weakens the
    /// threshold guarantee.
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

impl<T> Drop for FaaCycleCore<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        // Only slots whose cycle marks them CONSUMER_READABLE for an
        // index still in [head, tail) hold a live, undropped value.
        for idx in head..tail {
            let slot = &mut self.slots[(idx & self.mask) as usize];
            let expected_cycle = idx / self.capacity as u64 + 1;
            if *slot.cycle.get_mut() == expected_cycle {
                unsafe {
                    std::ptr::drop_in_place(slot.value.get_mut().as_mut_ptr());
                }
            }
        }
    }
}
