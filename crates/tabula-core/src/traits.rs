//! The shared array contract implemented by every backend.

use crate::cell::Cell;
use crate::counters::OpCounters;
use crate::error::{ArrayError, VerifyFailure};

/// An integer array with a constant-or-linear-time uniform fill.
///
/// The contract is a capability set shared by the baseline buffer and the
/// in-place schemes: `init` establishes a uniform fill value, `read` and
/// `write` behave as if that fill had been applied to every cell. The
/// in-place implementations honor this in O(1) per operation with O(log N)
/// bits of bookkeeping; the baseline fills in Θ(N).
///
/// Instances are single-owner and synchronous. No operation suspends,
/// retries, or recovers internally; failures surface as [`ArrayError`].
pub trait InitializableArray {
    /// Stable implementation tag (`std_vector`, `sec3`, or `sec4`).
    ///
    /// Shared with the cross-language result pipeline, so the tags are
    /// fixed even where they read unlike Rust type names.
    fn name(&self) -> &'static str;

    /// Number of logical cells.
    fn len(&self) -> usize;

    /// Always `false`: construction rejects zero-length arrays.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logically set every cell to `v`.
    ///
    /// Every index not subsequently written reads back as `v`.
    fn init(&mut self, v: Cell);

    /// Read the logical value at `i`.
    ///
    /// Fails with [`ArrayError::IndexOutOfRange`] when `i >= len()`.
    fn read(&mut self, i: usize) -> Result<Cell, ArrayError>;

    /// Write `v` to the logical cell at `i`.
    ///
    /// Fails with [`ArrayError::IndexOutOfRange`] when `i >= len()`.
    fn write(&mut self, i: usize, v: Cell) -> Result<(), ArrayError>;

    /// Zero all operation counters.
    fn reset_counters(&mut self);

    /// Current operation counters.
    fn counters(&self) -> OpCounters;

    /// Allocate and attach the shadow oracle.
    ///
    /// From this point every `init` and `write` is mirrored into shadow
    /// tables that [`verify_correctness`](Self::verify_correctness)
    /// sweeps against. Idempotent. Fails with
    /// [`ArrayError::OutOfMemory`] if the shadow tables cannot be
    /// allocated.
    fn enable_verification(&mut self) -> Result<(), ArrayError>;

    /// Sweep every logical cell against the shadow oracle and check the
    /// backend's structural invariants.
    ///
    /// Passes trivially when verification was never enabled. The `Err`
    /// payload carries the first divergence found.
    fn verify_correctness(&mut self) -> Result<(), VerifyFailure>;

    /// Render the internal state around `focus` for failure triage.
    ///
    /// The output is a multi-line human-readable snapshot; callers decide
    /// where it goes (the sweep binary logs it on mismatch).
    fn dump_state(&self, focus: usize) -> String;
}
