//! Fluent construction facade (`spec.md` §6). `QueueConfigBuilder` collects
//! the two access-mode flags, the compact hint, and the capacity request;
//! `QueueConfig::build_generic`/`build_handle`/`build_pointer` resolve that
//! into one of the nine algorithm/mode combinations and construct it.
//!
//! The four access modes are exactly the four `(single_producer,
//! single_consumer)` combinations, so there is no separate "requested mode"
//! field that could contradict the flags — the combination of booleans *is*
//! the mode, eliminating the invalid-mode states §6 warns against by
//! construction rather than by a runtime check.

use crate::cas_seq::{SeqMpmcPointerQueue, SeqMpmcQueue};
use crate::cas_seq::{SeqMpscPointerQueue, SeqMpscQueue};
use crate::cas_seq::{SeqSpmcPointerQueue, SeqSpmcQueue};
use crate::compact_handle::{CompactMpmcHandleQueue, CompactMpscHandleQueue, CompactSpmcHandleQueue};
use crate::faa_cycle::{MpmcHandleQueue, MpmcPointerQueue, MpmcQueue};
use crate::faa_cycle::{MpscHandleQueue, MpscPointerQueue, MpscQueue};
use crate::faa_cycle::{SpmcHandleQueue, SpmcPointerQueue, SpmcQueue};
use crate::spsc::{SpscHandleQueue, SpscPointerQueue, SpscQueue};
use crate::WouldBlock;

/// A resolved, validated construction request. Build one with
/// [`QueueConfigBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct QueueConfig {
    capacity: usize,
    single_producer: bool,
    single_consumer: bool,
    compact: bool,
}

impl QueueConfig {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn build_generic<T: Default>(&self) -> GenericQueue<T> {
        match (self.single_producer, self.single_consumer, self.compact) {
            (true, true, _) => GenericQueue::SpSc(SpscQueue::new(self.capacity)),
            (false, true, false) => GenericQueue::Mpsc(MpscQueue::new(self.capacity)),
            (false, true, true) => GenericQueue::CompactMpsc(SeqMpscQueue::new(self.capacity)),
            (true, false, false) => GenericQueue::Spmc(SpmcQueue::new(self.capacity)),
            (true, false, true) => GenericQueue::CompactSpmc(SeqSpmcQueue::new(self.capacity)),
            (false, false, false) => GenericQueue::Mpmc(MpmcQueue::new(self.capacity)),
            (false, false, true) => GenericQueue::CompactMpmc(SeqMpmcQueue::new(self.capacity)),
        }
    }

    /// For handle storage, `compact = true` resolves to the single-word
    /// empty-flag family (`compact_handle`, `spec.md` §4.6) rather than the
    /// dual-word CAS-sequence family — it is the more compact of the two
    /// representations available for this flavor. Callers who specifically
    /// want CAS-sequence semantics without the 63-bit restriction construct
    /// `Seq*HandleQueue` directly instead of going through this facade.
    #[must_use]
    pub fn build_handle(&self) -> HandleQueue {
        match (self.single_producer, self.single_consumer, self.compact) {
            (true, true, _) => HandleQueue::SpSc(SpscHandleQueue::new(self.capacity)),
            (false, true, false) => HandleQueue::Mpsc(MpscHandleQueue::new(self.capacity)),
            (false, true, true) => HandleQueue::CompactMpsc(CompactMpscHandleQueue::new(self.capacity)),
            (true, false, false) => HandleQueue::Spmc(SpmcHandleQueue::new(self.capacity)),
            (true, false, true) => HandleQueue::CompactSpmc(CompactSpmcHandleQueue::new(self.capacity)),
            (false, false, false) => HandleQueue::Mpmc(MpmcHandleQueue::new(self.capacity)),
            (false, false, true) => HandleQueue::CompactMpmc(CompactMpmcHandleQueue::new(self.capacity)),
        }
    }

    #[must_use]
    pub fn build_pointer(&self) -> PointerQueue {
        match (self.single_producer, self.single_consumer, self.compact) {
            (true, true, _) => PointerQueue::SpSc(SpscPointerQueue::new(self.capacity)),
            (false, true, false) => PointerQueue::Mpsc(MpscPointerQueue::new(self.capacity)),
            (false, true, true) => {
                PointerQueue::CompactMpsc(SeqMpscPointerQueue::new(self.capacity))
            }
            (true, false, false) => PointerQueue::Spmc(SpmcPointerQueue::new(self.capacity)),
            (true, false, true) => {
                PointerQueue::CompactSpmc(SeqSpmcPointerQueue::new(self.capacity))
            }
            (false, false, false) => PointerQueue::Mpmc(MpmcPointerQueue::new(self.capacity)),
            (false, false, true) => {
                PointerQueue::CompactMpmc(SeqMpmcPointerQueue::new(self.capacity))
            }
        }
    }
}

/// Builder for [`QueueConfig`]. Defaults: `single_producer = false`,
/// `single_consumer = false` (i.e. MP/MC unless narrowed), `compact = false`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueConfigBuilder {
    capacity: Option<usize>,
    single_producer: bool,
    single_consumer: bool,
    compact: bool,
}

impl QueueConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn single_producer(mut self, value: bool) -> Self {
        self.single_producer = value;
        self
    }

    #[must_use]
    pub fn single_consumer(mut self, value: bool) -> Self {
        self.single_consumer = value;
        self
    }

    #[must_use]
    pub fn compact(mut self, value: bool) -> Self {
        self.compact = value;
        self
    }

    /// Resolves the builder into a [`QueueConfig`]. Aborts the process if
    /// `capacity` was never set or is below 2 (`spec.md` §6, §7).
    #[must_use]
    pub fn build(self) -> QueueConfig {
        let capacity = self
            .capacity
            .expect("QueueConfigBuilder::build called without a capacity");
        assert!(
            capacity >= 2,
            "queue capacity must be >= 2, got {capacity}"
        );
        QueueConfig {
            capacity,
            single_producer: self.single_producer,
            single_consumer: self.single_consumer,
            compact: self.compact,
        }
    }
}

macro_rules! storage_enum {
    ($enum_name:ident, $sp_sc:ty, $mpmc:ty, $mpsc:ty, $spmc:ty, $compact_mpmc:ty, $compact_mpsc:ty, $compact_spmc:ty, $elem:ty) => {
        pub enum $enum_name {
            SpSc($sp_sc),
            Mpmc($mpmc),
            Mpsc($mpsc),
            Spmc($spmc),
            CompactMpmc($compact_mpmc),
            CompactMpsc($compact_mpsc),
            CompactSpmc($compact_spmc),
        }

        impl $enum_name {
            #[must_use]
            pub fn capacity(&self) -> usize {
                match self {
                    Self::SpSc(q) => q.capacity(),
                    Self::Mpmc(q) => q.capacity(),
                    Self::Mpsc(q) => q.capacity(),
                    Self::Spmc(q) => q.capacity(),
                    Self::CompactMpmc(q) => q.capacity(),
                    Self::CompactMpsc(q) => q.capacity(),
                    Self::CompactSpmc(q) => q.capacity(),
                }
            }

            pub fn enqueue(&self, item: $elem) -> Result<(), WouldBlock> {
                match self {
                    Self::SpSc(q) => q.enqueue(item),
                    Self::Mpmc(q) => q.enqueue(item),
                    Self::Mpsc(q) => q.enqueue(item),
                    Self::Spmc(q) => q.enqueue(item),
                    Self::CompactMpmc(q) => q.enqueue(item),
                    Self::CompactMpsc(q) => q.enqueue(item),
                    Self::CompactSpmc(q) => q.enqueue(item),
                }
            }

            pub fn dequeue(&self) -> Result<$elem, WouldBlock> {
                match self {
                    Self::SpSc(q) => q.dequeue(),
                    Self::Mpmc(q) => q.dequeue(),
                    Self::Mpsc(q) => q.dequeue(),
                    Self::Spmc(q) => q.dequeue(),
                    Self::CompactMpmc(q) => q.dequeue(),
                    Self::CompactMpsc(q) => q.dequeue(),
                    Self::CompactSpmc(q) => q.dequeue(),
                }
            }

            /// No-op on variants with no threshold mechanism (Lamport SP/SC,
            /// every compact CAS-sequence/compact-handle variant): `spec.md`
            /// §4.1 grants `drain_mode_on` only to the FAA-cycle family. The
            /// facade still exposes it uniformly so callers don't need to
            /// match on the resolved variant during shutdown.
            pub fn drain_mode_on(&self) {
                match self {
                    Self::Mpmc(q) => q.drain_mode_on(),
                    Self::Mpsc(q) => q.drain_mode_on(),
                    Self::Spmc(q) => q.drain_mode_on(),
                    _ => {}
                }
            }
        }
    };
}

storage_enum!(
    HandleQueue,
    SpscHandleQueue,
    MpmcHandleQueue,
    MpscHandleQueue,
    SpmcHandleQueue,
    CompactMpmcHandleQueue,
    CompactMpscHandleQueue,
    CompactSpmcHandleQueue,
    u64
);

storage_enum!(
    PointerQueue,
    SpscPointerQueue,
    MpmcPointerQueue,
    MpscPointerQueue,
    SpmcPointerQueue,
    SeqMpmcPointerQueue,
    SeqMpscPointerQueue,
    SeqSpmcPointerQueue,
    *mut ()
);

/// Generic by-value storage is not expressible through `storage_enum!`
/// cleanly (no compact handle analog exists for it), so it is written out
/// directly.
pub enum GenericQueue<T: Default> {
    SpSc(SpscQueue<T>),
    Mpmc(MpmcQueue<T>),
    Mpsc(MpscQueue<T>),
    Spmc(SpmcQueue<T>),
    CompactMpmc(SeqMpmcQueue<T>),
    CompactMpsc(SeqMpscQueue<T>),
    CompactSpmc(SeqSpmcQueue<T>),
}

impl<T: Default> GenericQueue<T> {
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self {
            Self::SpSc(q) => q.capacity(),
            Self::Mpmc(q) => q.capacity(),
            Self::Mpsc(q) => q.capacity(),
            Self::Spmc(q) => q.capacity(),
            Self::CompactMpmc(q) => q.capacity(),
            Self::CompactMpsc(q) => q.capacity(),
            Self::CompactSpmc(q) => q.capacity(),
        }
    }

    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        match self {
            Self::SpSc(q) => q.enqueue(item),
            Self::Mpmc(q) => q.enqueue(item),
            Self::Mpsc(q) => q.enqueue(item),
            Self::Spmc(q) => q.enqueue(item),
            Self::CompactMpmc(q) => q.enqueue(item),
            Self::CompactMpsc(q) => q.enqueue(item),
            Self::CompactSpmc(q) => q.enqueue(item),
        }
    }

    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        match self {
            Self::SpSc(q) => q.dequeue(),
            Self::Mpmc(q) => q.dequeue(),
            Self::Mpsc(q) => q.dequeue(),
            Self::Spmc(q) => q.dequeue(),
            Self::CompactMpmc(q) => q.dequeue(),
            Self::CompactMpsc(q) => q.dequeue(),
            Self::CompactSpmc(q) => q.dequeue(),
        }
    }

    pub fn drain_mode_on(&self) {
        match self {
            Self::Mpmc(q) => q.drain_mode_on(),
            Self::Mpsc(q) => q.drain_mode_on(),
            Self::Spmc(q) => q.drain_mode_on(),
            _ => {}
        }
    }
}
