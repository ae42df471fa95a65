//! Lamport SPSC ring: wait-free, cached-index, the default algorithm for the
//! SP/SC access mode (`spec.md` §4.2). The `compact` builder hint is ignored
//! here — a Lamport ring is already `n`-slot.

mod generic;
mod handle;
mod pointer;

pub use generic::SpscQueue;
pub use handle::SpscHandleQueue;
pub use pointer::SpscPointerQueue;
