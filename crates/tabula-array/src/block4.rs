//! Four-cell-block in-place initializable array with stashed metadata.
//!
//! Same chaining discipline as [`Block2Array`](crate::Block2Array) with
//! blocks of four, plus one refinement: while any unwritten-candidate
//! block remains, the array's final block doubles as the metadata holder,
//! mirroring the fill value and the boundary in its cells 1 and 2. Once the
//! boundary reaches the block count the structure degenerates into a plain
//! buffer and both chain detection and the stash disappear, leaving the
//! external bookkeeping at roughly one bit.

use std::fmt::Write as _;

use tabula_core::{
    base_of, block_of, offset_in, ArrayError, Cell, InitializableArray, OpCounters, VerifyFailure,
};

use crate::shadow::ShadowOracle;
use crate::zeroed_buf;

/// Cells per block.
const BLOCK: usize = 4;

/// In-place initializable array with four-cell blocks.
///
/// Block `bi` is chained iff `A[4*bi]` is a 4-aligned in-range index whose
/// block lies on the other side of the boundary and points back. A chained
/// unwritten-area block keeps logical cells 0..2 in the partner's cells
/// 1..3 and its final cell in place.
///
/// The boundary `b` and fill value are held as fields for speed and
/// mirrored into the final block's cells 1 and 2 after every boundary
/// change; while the final block serves as a chain partner those two
/// physical cells are dead storage, so the mirror stays harmless.
///
/// # Examples
///
/// ```
/// use tabula_array::Block4Array;
/// use tabula_core::InitializableArray;
///
/// let mut a = Block4Array::new(16).unwrap();
/// a.init(-1);
/// assert_eq!(a.read(11).unwrap(), -1);
/// a.write(11, 5).unwrap();
/// assert_eq!(a.read(11).unwrap(), 5);
/// assert_eq!(a.read(10).unwrap(), -1);
/// ```
#[derive(Clone, Debug)]
pub struct Block4Array {
    a: Vec<Cell>,
    n_blocks: usize,
    /// Boundary between the written-candidate and unwritten-candidate
    /// areas, in blocks. Invariant: `b <= n_blocks`.
    b: usize,
    initv: Cell,
    /// True once `b == n_blocks`: every block is promoted and the array
    /// behaves as a trivial buffer.
    saturated: bool,
    counters: OpCounters,
    shadow: Option<ShadowOracle>,
}

impl Block4Array {
    /// Create a zero-initialized array of `n` cells (`n % 4 == 0`, nonzero).
    pub fn new(n: usize) -> Result<Self, ArrayError> {
        if n == 0 || n % BLOCK != 0 {
            return Err(ArrayError::InvalidSize {
                n,
                multiple_of: BLOCK,
            });
        }
        Ok(Self {
            a: zeroed_buf(n)?,
            n_blocks: n / BLOCK,
            b: 0,
            initv: 0,
            saturated: false,
            counters: OpCounters::default(),
            shadow: None,
        })
    }

    /// Re-derive the saturation flag and mirror `initv`/`b` into the
    /// final block. Must follow every change to `b`.
    fn sync_meta(&mut self) {
        self.saturated = self.b >= self.n_blocks;
        if !self.saturated {
            let mb = base_of(self.n_blocks - 1, BLOCK);
            self.a[mb + 1] = self.initv;
            self.a[mb + 2] = self.b as Cell;
        }
    }

    /// Partner block of `bi` if it is currently chained.
    fn chained_to(&self, bi: usize) -> Option<usize> {
        let k0 = self.a[base_of(bi, BLOCK)];
        if k0 < 0 {
            return None;
        }
        let target = k0 as usize;
        if target % BLOCK != 0 || target >= self.a.len() {
            return None;
        }
        let bj = block_of(target, BLOCK);
        if (bi < self.b) == (bj < self.b) {
            return None;
        }
        if self.a[target] != base_of(bi, BLOCK) as Cell {
            return None;
        }
        Some(bj)
    }

    fn make_chain(&mut self, bi: usize, bj: usize) {
        self.a[base_of(bi, BLOCK)] = base_of(bj, BLOCK) as Cell;
        self.a[base_of(bj, BLOCK)] = base_of(bi, BLOCK) as Cell;
        self.counters.conversions += 1;
    }

    fn break_chain(&mut self, bi: usize) {
        if let Some(bj) = self.chained_to(bi) {
            self.a[base_of(bj, BLOCK)] = base_of(bj, BLOCK) as Cell;
            self.counters.conversions += 1;
        }
    }

    fn init_block(&mut self, bi: usize) {
        let base = base_of(bi, BLOCK);
        self.a[base..base + BLOCK].fill(self.initv);
    }

    /// Promote the boundary block into the written-candidate area.
    ///
    /// Returns a block that is now unchained and safe for the caller to
    /// claim. Ends with a metadata sync in both branches.
    fn extend(&mut self) -> usize {
        let s = self.b;
        debug_assert!(s < self.n_blocks);
        let chained = self.chained_to(s);
        self.b += 1;
        match chained {
            None => {
                self.init_block(s);
                self.break_chain(s);
                self.sync_meta();
                s
            }
            Some(bk) => {
                // The partner is a written-area block carrying this
                // block's displaced cells 0..2 at offsets 1..3; the final
                // cell is already in place.
                let src = base_of(bk, BLOCK);
                let dst = base_of(s, BLOCK);
                self.a[dst] = self.a[src + 1];
                self.a[dst + 1] = self.a[src + 2];
                self.a[dst + 2] = self.a[src + 3];
                self.break_chain(s);
                self.init_block(bk);
                self.break_chain(bk);
                self.counters.relocations += 1;
                self.sync_meta();
                bk
            }
        }
    }

    /// Logical value at `i`, counters and bounds checks aside.
    fn read_cell(&self, i: usize) -> Cell {
        if self.saturated {
            return self.a[i];
        }
        let bi = block_of(i, BLOCK);
        let chained = self.chained_to(bi);
        if bi < self.b {
            match chained {
                Some(_) => self.initv,
                None => self.a[i],
            }
        } else {
            match chained {
                Some(bk) => match offset_in(i, BLOCK) {
                    off @ 0..=2 => self.a[base_of(bk, BLOCK) + 1 + off],
                    _ => self.a[i],
                },
                None => self.initv,
            }
        }
    }

    fn write_cell(&mut self, i: usize, v: Cell) {
        if self.saturated {
            self.a[i] = v;
            return;
        }
        let bi = block_of(i, BLOCK);
        let chained = self.chained_to(bi);

        if bi < self.b {
            match chained {
                None => {
                    self.a[i] = v;
                    self.break_chain(bi);
                }
                Some(k) => {
                    let bj = self.extend();
                    if bj == bi {
                        self.a[i] = v;
                        self.break_chain(bi);
                    } else {
                        for t in 0..BLOCK {
                            self.a.swap(base_of(bj, BLOCK) + t, base_of(bi, BLOCK) + t);
                        }
                        self.counters.relocations += 1;
                        self.make_chain(bj, k);
                        self.init_block(bi);
                        self.a[i] = v;
                        self.break_chain(bi);
                    }
                }
            }
        } else {
            match chained {
                Some(bk) => match offset_in(i, BLOCK) {
                    off @ 0..=2 => self.a[base_of(bk, BLOCK) + 1 + off] = v,
                    _ => self.a[i] = v,
                },
                None => {
                    let bk2 = self.extend();
                    if bk2 == bi {
                        self.a[i] = v;
                        self.break_chain(bi);
                    } else {
                        self.init_block(bi);
                        self.make_chain(bk2, bi);
                        match offset_in(i, BLOCK) {
                            off @ 0..=2 => self.a[base_of(bk2, BLOCK) + 1 + off] = v,
                            _ => self.a[i] = v,
                        }
                    }
                }
            }
        }
    }

    /// Structural sweep: chains must be reciprocal, and while the final
    /// block is unchained its stash cells must mirror the cached scalars.
    fn check_structure(&self) -> Result<(), VerifyFailure> {
        for bi in 0..self.n_blocks {
            if let Some(bj) = self.chained_to(bi) {
                if self.chained_to(bj) != Some(bi) {
                    return Err(VerifyFailure::ChainAsymmetry {
                        block: bi,
                        partner: bj,
                    });
                }
            }
        }
        if !self.saturated {
            let mb = self.n_blocks - 1;
            if self.chained_to(mb).is_none() {
                let base = base_of(mb, BLOCK);
                if self.a[base + 1] != self.initv {
                    return Err(VerifyFailure::MetadataMismatch {
                        index: base + 1,
                        expected: self.initv,
                        actual: self.a[base + 1],
                    });
                }
                if self.a[base + 2] != self.b as Cell {
                    return Err(VerifyFailure::MetadataMismatch {
                        index: base + 2,
                        expected: self.b as Cell,
                        actual: self.a[base + 2],
                    });
                }
            }
        }
        Ok(())
    }
}

impl InitializableArray for Block4Array {
    fn name(&self) -> &'static str {
        "sec4"
    }

    fn len(&self) -> usize {
        self.a.len()
    }

    fn init(&mut self, v: Cell) {
        self.counters.inits += 1;
        self.initv = v;
        self.b = 0;
        self.sync_meta();
        if let Some(shadow) = self.shadow.as_mut() {
            shadow.on_init(v);
        }
    }

    fn read(&mut self, i: usize) -> Result<Cell, ArrayError> {
        self.counters.reads += 1;
        if i >= self.a.len() {
            return Err(ArrayError::IndexOutOfRange {
                index: i,
                len: self.a.len(),
            });
        }
        Ok(self.read_cell(i))
    }

    fn write(&mut self, i: usize, v: Cell) -> Result<(), ArrayError> {
        self.counters.writes += 1;
        if i >= self.a.len() {
            return Err(ArrayError::IndexOutOfRange {
                index: i,
                len: self.a.len(),
            });
        }
        self.write_cell(i, v);
        if let Some(shadow) = self.shadow.as_mut() {
            shadow.on_write(i, v);
        }
        Ok(())
    }

    fn reset_counters(&mut self) {
        self.counters = OpCounters::default();
    }

    fn counters(&self) -> OpCounters {
        self.counters
    }

    fn enable_verification(&mut self) -> Result<(), ArrayError> {
        if self.shadow.is_none() {
            self.shadow = Some(ShadowOracle::new(self.a.len())?);
        }
        Ok(())
    }

    fn verify_correctness(&mut self) -> Result<(), VerifyFailure> {
        if let Some(shadow) = self.shadow.as_ref() {
            shadow.check_against(|i| self.read_cell(i))?;
        }
        self.check_structure()
    }

    fn dump_state(&self, focus: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "sec4 state: n={} n_blocks={} b={} initv={} saturated={} focus={focus}",
            self.a.len(),
            self.n_blocks,
            self.b,
            self.initv,
            self.saturated,
        );
        let fb = block_of(focus, BLOCK);
        let start = fb.saturating_sub(3);
        let end = (fb + 4).min(self.n_blocks);
        for bi in start..end {
            let area = if bi < self.b { "WCA" } else { "UCA" };
            let base = base_of(bi, BLOCK);
            let _ = writeln!(
                out,
                "  B{bi} [{area}] ({}, {}, {}, {})",
                self.a[base],
                self.a[base + 1],
                self.a[base + 2],
                self.a[base + 3],
            );
        }
        out
    }
}
