//! Debug assertion macros for the invariants documented in `spec.md` §3.
//!
//! Active only under `#[cfg(debug_assertions)]`, so release builds pay
//! nothing for them. Shared across the Lamport, FAA-cycle, CAS-sequence and
//! compact-handle cores.

/// INV-CAP-01: capacity is a power of two and at least 2.
macro_rules! debug_assert_valid_capacity {
    ($capacity:expr) => {
        debug_assert!(
            $capacity >= 2 && $capacity.is_power_of_two(),
            "INV-CAP-01 violated: capacity {} is not a power of two >= 2",
            $capacity
        )
    };
}

/// INV-SEQ-02: a counter (head or tail) only ever increases.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-SEQ-02 violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// INV-SEQ-01: an observed (head, tail) pair never has head > tail outside
/// an in-flight empty-skip race.
macro_rules! debug_assert_head_not_past_tail {
    ($head:expr, $tail:expr) => {
        debug_assert!(
            $head <= $tail,
            "INV-SEQ-01 violated: head {} is past tail {}",
            $head,
            $tail
        )
    };
}

/// INV-CYC-01: a producer only ever publishes into a slot whose observed
/// cycle matches its expected generation.
macro_rules! debug_assert_cycle_match {
    ($observed:expr, $expected:expr) => {
        debug_assert!(
            $observed == $expected,
            "INV-CYC-01 violated: slot cycle {} does not match expected generation {}",
            $observed,
            $expected
        )
    };
}

/// INV-THR-01: threshold never has to go below `-(3n)` to stay bounded;
/// a threshold that drifts arbitrarily negative indicates the reset-on-success
/// path was skipped somewhere.
macro_rules! debug_assert_threshold_bounded {
    ($threshold:expr, $capacity:expr) => {
        debug_assert!(
            $threshold >= -(3 * $capacity as i64) - 1,
            "INV-THR-01 violated: threshold {} drifted unbounded for capacity {}",
            $threshold,
            $capacity
        )
    };
}

pub(crate) use debug_assert_cycle_match;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_threshold_bounded;
pub(crate) use debug_assert_valid_capacity;
