//! Per-instance operation counters.
//!
//! [`OpCounters`] accumulates the instrumentation every array backend
//! exposes: call counts for the three public operations plus the two
//! structural events of the in-place schemes (block relocations and chain
//! conversions). Counters only ever increase between `reset_counters`
//! calls.

/// Operation counts accumulated by an array instance.
///
/// `reads`, `writes`, and `inits` increment once per call, before index
/// validation, so failed operations are still counted. `relocations`
/// counts block-content copies between blocks; `conversions` counts chain
/// make/break events that actually toggled chain state. Both stay zero
/// for the baseline buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpCounters {
    /// Number of `read` calls.
    pub reads: u64,
    /// Number of `write` calls.
    pub writes: u64,
    /// Number of `init` calls.
    pub inits: u64,
    /// Number of block-content copies between blocks.
    pub relocations: u64,
    /// Number of chain state toggles (make or break).
    pub conversions: u64,
}
