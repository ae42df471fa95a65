use super::generic::SpscQueue;
use crate::WouldBlock;

/// Newtype carrying an opaque raw pointer's bit pattern through the generic
/// Lamport core. `Default` is the null pointer, which the generic core
/// writes into consumed slots so it never retains a moved-from reference.
///
/// The referent's lifetime is entirely the caller's responsibility (`spec.md`
/// §3): this queue performs no indirection and never dereferences the
/// pointer itself.
#[derive(Clone, Copy)]
struct RawSlot(*mut ());

impl Default for RawSlot {
    fn default() -> Self {
        Self(std::ptr::null_mut())
    }
}

// SAFETY: the queue never dereferences the pointer; it only moves the bit
// pattern between threads. The caller guarantees the referent's lifetime and
// any cross-thread access safety for whatever the pointer addresses.
unsafe impl Send for RawSlot {}

/// SPSC Lamport ring specialized to an opaque raw pointer, preserving the
/// bit pattern exactly across `enqueue`/`dequeue`.
pub struct SpscPointerQueue(SpscQueue<RawSlot>);

impl SpscPointerQueue {
    #[must_use]
    pub fn new(requested_capacity: usize) -> Self {
        Self(SpscQueue::new(requested_capacity))
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    #[inline]
    pub fn enqueue(&self, ptr: *mut ()) -> Result<(), WouldBlock> {
        self.0.enqueue(RawSlot(ptr))
    }

    #[inline]
    pub fn dequeue(&self) -> Result<*mut (), WouldBlock> {
        self.0.dequeue().map(|slot| slot.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_bit_pattern_round_trips() {
        let q = SpscPointerQueue::new(4);
        let mut x = 42u32;
        let ptr = std::ptr::addr_of_mut!(x).cast::<()>();
        assert!(q.enqueue(ptr).is_ok());
        assert_eq!(q.dequeue(), Ok(ptr));
    }

    #[test]
    fn null_pointer_is_a_legal_value() {
        let q = SpscPointerQueue::new(4);
        assert!(q.enqueue(std::ptr::null_mut()).is_ok());
        assert_eq!(q.dequeue(), Ok(std::ptr::null_mut()));
    }
}
