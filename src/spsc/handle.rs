use super::generic::SpscQueue;
use crate::WouldBlock;

/// SPSC Lamport ring specialized to pointer-sized integer handles.
///
/// A thin newtype over [`SpscQueue<u64>`]: the Lamport algorithm is already
/// generic over the payload, and `u64` satisfies `Default` trivially, so the
/// handle flavor reuses the generic core body for byte. All 64 bits are legal
/// values (the 63-bit restriction only applies to the single-word compact
/// MP/MC handle queue in `compact_handle`).
pub struct SpscHandleQueue(SpscQueue<u64>);

impl SpscHandleQueue {
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
    pub fn enqueue(&self, value: u64) -> Result<(), WouldBlock> {
        self.0.enqueue(value)
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u64, WouldBlock> {
        self.0.dequeue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_max_handle_round_trip() {
        let q = SpscHandleQueue::new(4);
        assert!(q.enqueue(0).is_ok());
        assert!(q.enqueue(u64::MAX).is_ok());
        assert_eq!(q.dequeue(), Ok(0));
        assert_eq!(q.dequeue(), Ok(u64::MAX));
    }
}
