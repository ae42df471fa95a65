//! A family of bounded, lock-free FIFO queues for high-throughput worker
//! pools, event aggregation, pipeline stages, and buffer-index pools.
//!
//! Three algorithm families, each specialized by access mode (single- or
//! multi-producer crossed with single- or multi-consumer) and by storage
//! flavor (generic by-value `T`, pointer-sized integer handle, opaque raw
//! pointer):
//!
//! - [`spsc`] — a cached-index Lamport ring, wait-free, for SP/SC.
//! - [`faa_cycle`] — a cycle-annotated fetch-and-add queue (SCQ-style) with
//!   `2n` physical slots, a livelock-prevention threshold and a drain-mode
//!   latch. The default algorithm for MP/SC, SP/MC and MP/MC.
//! - [`cas_seq`] — a sequence-numbered compare-and-swap queue (Vyukov-style)
//!   with `n` physical slots. A compact alternative to `faa_cycle` for the
//!   same three modes.
//! - [`compact_handle`] — a single-word empty-flag encoding exclusive to the
//!   handle storage flavor, folding a slot's generation tag and payload into
//!   one 64-bit atomic at the cost of a 63-bit value domain.
//!
//! [`config`] provides a fluent construction facade that resolves access-mode
//! flags and a `compact` hint into one of the above. Every operation signals
//! back-pressure uniformly through [`WouldBlock`], never through a richer
//! error type; see [`error`] for the non-failure classifiers.
//!
//! No queue in this crate blocks, sleeps, or yields the calling thread on
//! its own account, and none reports a length: an accurate length would
//! require reconciling `head`/`tail` with in-flight repair transients, which
//! is expensive and rarely worth it. Callers that need back-pressure metrics
//! should track counts outside the queue.

mod backoff;
mod invariants;
mod padding;

pub mod cas_seq;
pub mod compact_handle;
pub mod config;
pub mod error;
pub mod faa_cycle;
pub mod spsc;

pub use cas_seq::{
    SeqMpmcHandleQueue, SeqMpmcPointerQueue, SeqMpmcQueue, SeqMpscHandleQueue,
    SeqMpscPointerQueue, SeqMpscQueue, SeqSpmcHandleQueue, SeqSpmcPointerQueue, SeqSpmcQueue,
};
pub use compact_handle::{CompactMpmcHandleQueue, CompactMpscHandleQueue, CompactSpmcHandleQueue};
pub use config::{GenericQueue, HandleQueue, PointerQueue, QueueConfig, QueueConfigBuilder};
pub use error::{is_control_signal, is_non_failure, is_would_block, WouldBlock};
pub use faa_cycle::{
    MpmcHandleQueue, MpmcPointerQueue, MpmcQueue, MpscHandleQueue, MpscPointerQueue, MpscQueue,
    SpmcHandleQueue, SpmcPointerQueue, SpmcQueue,
};
pub use spsc::{SpscHandleQueue, SpscPointerQueue, SpscQueue};

/// Rounds a requested capacity up to the next power of two (`spec.md` §3).
/// Callers assert `requested_capacity >= 2` before calling this; the result
/// is always a valid mask-friendly capacity.
pub(crate) fn round_up_capacity(requested_capacity: usize) -> usize {
    requested_capacity.next_power_of_two()
}
