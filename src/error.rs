use thiserror::Error;

/// The sole runtime signal produced by any queue operation.
///
/// `WouldBlock` is returned by `enqueue` when the queue is full (or the
/// calling thread lost a multi-producer race under the variant's rules) and
/// by `dequeue` when the queue is empty (or the calling thread lost a
/// multi-consumer race). It is a control signal, not a failure: the core
/// never produces any other error kind. Callers retry with externally
/// supplied back-off; the queue itself never decides to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation would block")]
pub struct WouldBlock;

/// Returns true if `result` is the `WouldBlock` control signal.
///
/// Alias for `result.is_err()` specialized to this crate's single error
/// type, so callers can name the check instead of repeating `is_err()`.
#[must_use]
pub fn is_would_block<T>(result: &Result<T, WouldBlock>) -> bool {
    result.is_err()
}

/// `WouldBlock` is the only non-failure control signal this crate produces;
/// this is an alias for [`is_would_block`] under the name used by callers
/// that want to fold it into normal control flow rather than treat it as an
/// error.
#[must_use]
pub fn is_control_signal<T>(result: &Result<T, WouldBlock>) -> bool {
    is_would_block(result)
}

/// `WouldBlock` never represents a genuine failure (there are no other
/// error kinds in this crate), so this is equivalent to [`is_would_block`].
/// Provided for readability at call sites that distinguish "non-failure
/// control signal" from "real error" in a broader error taxonomy.
#[must_use]
pub fn is_non_failure<T>(result: &Result<T, WouldBlock>) -> bool {
    is_would_block(result)
}
