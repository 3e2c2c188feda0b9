//! Epoch-stamped shadow oracle for correctness sweeps.
//!
//! [`ShadowOracle`] records the expected logical value of every index
//! without ever bulk-clearing on `init`: an epoch counter stamps each
//! write, so a stamp from an older epoch means the index still reads as
//! the fill value. This keeps the Θ(1) `init` contract of the structure
//! under test intact during verification runs.

use tabula_core::{ArrayError, Cell, VerifyFailure};

use crate::zeroed_buf;

/// Side-channel recording of expected per-index values.
///
/// Backends own one behind `Option` and forward `init`/`write` into it;
/// a final [`check_against`](Self::check_against) sweep compares every
/// index. When disabled (the `Option` is `None`) no shadow work happens
/// at all.
#[derive(Clone, Debug)]
pub struct ShadowOracle {
    shadow: Vec<Cell>,
    stamp: Vec<u32>,
    initv: Cell,
    epoch: u32,
}

impl ShadowOracle {
    /// Allocate shadow tables for an array of `n` cells.
    pub fn new(n: usize) -> Result<Self, ArrayError> {
        Ok(Self {
            shadow: zeroed_buf(n)?,
            stamp: zeroed_buf(n)?,
            initv: 0,
            epoch: 1,
        })
    }

    /// Record an `init(v)`.
    ///
    /// Advances the epoch; on wraparound the stamp table is cleared and
    /// the epoch restarts at 1 so stale stamps can never alias.
    pub fn on_init(&mut self, v: Cell) {
        self.initv = v;
        self.epoch = match self.epoch.checked_add(1) {
            Some(e) => e,
            None => {
                self.stamp.fill(0);
                1
            }
        };
    }

    /// Record a `write(i, v)`.
    pub fn on_write(&mut self, i: usize, v: Cell) {
        self.shadow[i] = v;
        self.stamp[i] = self.epoch;
    }

    /// The value index `i` must currently read as.
    pub fn expected(&self, i: usize) -> Cell {
        if self.stamp[i] == self.epoch {
            self.shadow[i]
        } else {
            self.initv
        }
    }

    /// Sweep every index, comparing `read` against the expectation.
    ///
    /// Returns the first divergence as a
    /// [`VerifyFailure::ValueMismatch`].
    pub fn check_against(
        &self,
        mut read: impl FnMut(usize) -> Cell,
    ) -> Result<(), VerifyFailure> {
        for i in 0..self.shadow.len() {
            let expected = self.expected(i);
            let actual = read(i);
            if expected != actual {
                return Err(VerifyFailure::ValueMismatch {
                    index: i,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
