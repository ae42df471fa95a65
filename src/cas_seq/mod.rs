//! CAS-sequence (Vyukov-style) queue family: the compact alternative to
//! FAA-cycle for MP/MC, MP/SC and SP/MC (`spec.md` §4.5). `n` physical slots
//! back a usable capacity of `n`, trading FAA-cycle's `2n` overprovisioning
//! and livelock threshold for a per-slot monotone sequence number.

mod core;
mod dual_core;

use self::core::CasSeqCore;
use self::dual_core::DualCasSeqCore;
use crate::WouldBlock;

/// Multi-producer/multi-consumer queue, generic by-value storage, `n`-slot
/// CAS-sequence core.
pub struct SeqMpmcQueue<T>(CasSeqCore<T>);

impl<T: Default> SeqMpmcQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CasSeqCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(item)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        self.0.dequeue_mc()
    }
}

/// Multi-producer/single-consumer queue, generic by-value storage.
pub struct SeqMpscQueue<T>(CasSeqCore<T>);

impl<T: Default> SeqMpscQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CasSeqCore::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(item)
    }

    /// Must only be called from the single consumer thread.
    #[inline]
    pub fn dequeue(&self) -> Result<T, WouldBlock> {
        self.0.dequeue_sc()
    }
}

/// Single-producer/multi-consumer queue, generic by-value storage.
pub struct SeqSpmcQueue<T>(CasSeqCore<T>);

impl<T: Default> SeqSpmcQueue<T> {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(CasSeqCore::new(requested_capacity))
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
}

macro_rules! dual_word_seq_queue {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name(DualCasSeqCore);

        impl $name {
            #[must_use]
            pub fn new(requested_capacity: usize) -> Self {
                Self(DualCasSeqCore::new(requested_capacity))
            }

            #[inline]
            #[must_use]
            pub fn capacity(&self) -> usize {
                self.0.capacity()
            }
        }
    };
}

dual_word_seq_queue!(
    SeqMpmcHandleQueue,
    "MP/MC CAS-sequence queue over pointer-sized handles, fused `(sequence, value)` 128-bit atomic slots."
);
dual_word_seq_queue!(
    SeqMpscHandleQueue,
    "MP/SC CAS-sequence queue over pointer-sized handles, fused `(sequence, value)` 128-bit atomic slots."
);
dual_word_seq_queue!(
    SeqSpmcHandleQueue,
    "SP/MC CAS-sequence queue over pointer-sized handles, fused `(sequence, value)` 128-bit atomic slots."
);

impl SeqMpmcHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

impl SeqMpscHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_sc()
    }
}

impl SeqSpmcHandleQueue {
    #[inline]
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue_mc()
    }
}

dual_word_seq_queue!(
    SeqMpmcPointerQueue,
    "MP/MC CAS-sequence queue over opaque raw pointers, fused `(sequence, value)` 128-bit atomic slots."
);
dual_word_seq_queue!(
    SeqMpscPointerQueue,
    "MP/SC CAS-sequence queue over opaque raw pointers, fused `(sequence, value)` 128-bit atomic slots."
);
dual_word_seq_queue!(
    SeqSpmcPointerQueue,
    "SP/MC CAS-sequence queue over opaque raw pointers, fused `(sequence, value)` 128-bit atomic slots."
);

impl SeqMpmcPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(ptr as u64)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_mc().map(|v| v as usize as *mut ())
    }
}

impl SeqMpscPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_mp(ptr as u64)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_sc().map(|v| v as usize as *mut ())
    }
}

impl SeqSpmcPointerQueue {
    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue_sp(ptr as u64)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue_mc().map(|v| v as usize as *mut ())
    }
}
