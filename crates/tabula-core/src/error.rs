//! Error types for array construction, access, and verification.

use std::error::Error;
use std::fmt;

use crate::cell::Cell;

/// Errors from array construction and element access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// Construction with a size of zero or one that violates the
    /// backend's block divisibility requirement.
    InvalidSize {
        /// The requested element count.
        n: usize,
        /// The block size the count must be a positive multiple of.
        multiple_of: usize,
    },
    /// A `read` or `write` with an index at or beyond the array length.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The array length.
        len: usize,
    },
    /// Allocation failure at construction (cell buffer or shadow tables).
    OutOfMemory {
        /// Number of bytes the failed allocation requested.
        requested_bytes: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { n, multiple_of } => {
                write!(
                    f,
                    "invalid size {n}: must be a positive multiple of {multiple_of}"
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::OutOfMemory { requested_bytes } => {
                write!(f, "allocation of {requested_bytes} bytes failed")
            }
        }
    }
}

impl Error for ArrayError {}

/// A failed verification sweep.
///
/// Returned by `verify_correctness` so the caller gets the first
/// divergence as structured data rather than a bare failure verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyFailure {
    /// A logical cell disagreed with the shadow oracle's expectation.
    ValueMismatch {
        /// The diverging index.
        index: usize,
        /// The value the oracle expected.
        expected: Cell,
        /// The value the array returned.
        actual: Cell,
    },
    /// A detected chain whose partner does not point back.
    ChainAsymmetry {
        /// The block whose chain probe succeeded.
        block: usize,
        /// The partner that failed the reciprocal probe.
        partner: usize,
    },
    /// A stashed metadata cell disagreed with the cached scalar it mirrors.
    MetadataMismatch {
        /// The flat index of the stash cell.
        index: usize,
        /// The cached value the stash must mirror.
        expected: Cell,
        /// The value actually stored.
        actual: Cell,
    },
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueMismatch {
                index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "value mismatch at index {index}: expected {expected}, got {actual}"
                )
            }
            Self::ChainAsymmetry { block, partner } => {
                write!(f, "chain asymmetry: block {block} <-> block {partner}")
            }
            Self::MetadataMismatch {
                index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "stashed metadata mismatch at index {index}: expected {expected}, got {actual}"
                )
            }
        }
    }
}

impl Error for VerifyFailure {}
