//! Cache-line padding helper.
//!
//! Every hot-contended field (`head`, `tail`, `threshold`, `draining`, the
//! Lamport cached-index fields, and every slot) is isolated in its own cache
//! line so producers and consumers never false-share. Rather than hand-roll
//! an aligned wrapper, we reuse `crossbeam_utils::CachePadded`, which is
//! already part of the dependency graph and picks the right alignment per
//! target (128 bytes on Apple silicon and recent x86 with adjacent-line
//! prefetch, 64 elsewhere).

pub use crossbeam_utils::CachePadded;
