//! Two-cell-block in-place initializable array.
//!
//! Cells are grouped into blocks of two. A boundary `b` splits the blocks
//! into a written-candidate area (index `< b`) and an unwritten-candidate
//! area (index `>= b`); a symmetric chain relation pairs blocks across the
//! boundary so written content in the unwritten area can be displaced into
//! otherwise-unused written-area space. `init` only resets the boundary
//! and the fill value, so it is O(1); the bookkeeping beyond the cells
//! themselves is the two scalars `b` and `initv`, 2⌈log₂N⌉ bits in all.

use std::fmt::Write as _;

use tabula_core::{
    base_of, block_of, ArrayError, Cell, InitializableArray, OpCounters, VerifyFailure,
};

use crate::shadow::ShadowOracle;
use crate::zeroed_buf;

/// Cells per block.
const BLOCK: usize = 2;

/// In-place initializable array with two-cell blocks.
///
/// Chain state is encoded in the cells themselves: block `bi` is chained
/// iff `A[2*bi]` is an even in-range index whose block lies on the other
/// side of the boundary and points back (`A[A[2*bi]] == 2*bi`). A chained
/// boundary-area block logically reads as the fill value; a chained
/// unwritten-area block keeps its first logical cell in the partner's
/// second cell and its second logical cell in place.
///
/// # Examples
///
/// ```
/// use tabula_array::Block2Array;
/// use tabula_core::InitializableArray;
///
/// let mut a = Block2Array::new(8).unwrap();
/// a.init(7);
/// assert_eq!(a.read(5).unwrap(), 7);
/// a.write(5, 99).unwrap();
/// assert_eq!(a.read(5).unwrap(), 99);
/// assert_eq!(a.read(4).unwrap(), 7);
/// ```
#[derive(Clone, Debug)]
pub struct Block2Array {
    a: Vec<Cell>,
    n_blocks: usize,
    /// Boundary between the written-candidate and unwritten-candidate
    /// areas, in blocks. Invariant: `b <= n_blocks`.
    b: usize,
    initv: Cell,
    counters: OpCounters,
    shadow: Option<ShadowOracle>,
}

impl Block2Array {
    /// Create a zero-initialized array of `n` cells (`n` even, nonzero).
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
            counters: OpCounters::default(),
            shadow: None,
        })
    }

    /// Partner block of `bi` if it is currently chained.
    ///
    /// The probe is invariant-respecting: alignment, range, cross-side
    /// residency, and the reciprocal back-pointer must all hold, so no
    /// user value in an unchained block can fake a chain.
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

    /// Dissolve `bi`'s chain if one exists.
    ///
    /// The partner's zeroth cell is overwritten with a self-reference:
    /// a same-side target fails the cross-side probe, so detection stops
    /// succeeding from both ends.
    fn break_chain(&mut self, bi: usize) {
        if let Some(bj) = self.chained_to(bi) {
            self.a[base_of(bj, BLOCK)] = base_of(bj, BLOCK) as Cell;
            self.counters.conversions += 1;
        }
    }

    fn init_block(&mut self, bi: usize) {
        let base = base_of(bi, BLOCK);
        self.a[base] = self.initv;
        self.a[base + 1] = self.initv;
    }

    /// Promote the boundary block into the written-candidate area.
    ///
    /// Returns a block that is now unchained and safe for the caller to
    /// claim: the promoted block itself, or its freed former partner when
    /// the boundary block was chained.
    fn extend(&mut self) -> usize {
        let s = self.b;
        debug_assert!(s < self.n_blocks);
        let chained = self.chained_to(s);
        self.b += 1;
        match chained {
            None => {
                self.init_block(s);
                self.break_chain(s);
                s
            }
            Some(bk) => {
                // The boundary block sits in the unwritten area, so its
                // partner is a written-area block holding the displaced
                // first cell at offset 1; the second cell is already in
                // place.
                self.a[base_of(s, BLOCK)] = self.a[base_of(bk, BLOCK) + 1];
                self.break_chain(s);
                self.init_block(bk);
                self.break_chain(bk);
                self.counters.relocations += 1;
                bk
            }
        }
    }

    /// Logical value at `i`, counters and bounds checks aside.
    fn read_cell(&self, i: usize) -> Cell {
        let bi = block_of(i, BLOCK);
        let chained = self.chained_to(bi);
        if bi < self.b {
            match chained {
                Some(_) => self.initv,
                None => self.a[i],
            }
        } else {
            match chained {
                // Offset 0 was displaced into the partner; offset 1 is
                // never touched by chain bookkeeping and stays in place.
                Some(bk) => {
                    if i % BLOCK == 0 {
                        self.a[base_of(bk, BLOCK) + 1]
                    } else {
                        self.a[i]
                    }
                }
                None => self.initv,
            }
        }
    }

    fn write_cell(&mut self, i: usize, v: Cell) {
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
                        // Move the displaced content (and cross-ref) into
                        // the freed block, re-point the chain at it, and
                        // reclaim this block for the direct write.
                        self.a.swap(base_of(bj, BLOCK), base_of(bi, BLOCK));
                        self.a.swap(base_of(bj, BLOCK) + 1, base_of(bi, BLOCK) + 1);
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
                Some(bk) => {
                    if i % BLOCK == 0 {
                        self.a[base_of(bk, BLOCK) + 1] = v;
                    } else {
                        self.a[i] = v;
                    }
                }
                None => {
                    let bk2 = self.extend();
                    if bk2 == bi {
                        self.a[i] = v;
                        self.break_chain(bi);
                    } else {
                        self.init_block(bi);
                        self.make_chain(bk2, bi);
                        if i % BLOCK == 0 {
                            self.a[base_of(bk2, BLOCK) + 1] = v;
                        } else {
                            self.a[i] = v;
                        }
                    }
                }
            }
        }
    }

    /// Structural sweep: every detected chain must be reciprocal and the
    /// relation a partial matching.
    fn check_chains(&self) -> Result<(), VerifyFailure> {
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
        Ok(())
    }
}

impl InitializableArray for Block2Array {
    fn name(&self) -> &'static str {
        "sec3"
    }

    fn len(&self) -> usize {
        self.a.len()
    }

    fn init(&mut self, v: Cell) {
        self.counters.inits += 1;
        self.initv = v;
        self.b = 0;
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
        self.check_chains()
    }

    fn dump_state(&self, focus: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "sec3 state: n={} n_blocks={} b={} initv={} focus={focus}",
            self.a.len(),
            self.n_blocks,
            self.b,
            self.initv,
        );
        let fb = block_of(focus, BLOCK);
        let start = fb.saturating_sub(4);
        let end = (fb + 5).min(self.n_blocks);
        for bi in start..end {
            let area = if bi < self.b { "WCA" } else { "UCA" };
            let base = base_of(bi, BLOCK);
            let _ = writeln!(
                out,
                "  B{bi} [{area}] ({}, {})",
                self.a[base],
                self.a[base + 1],
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use crate::VecArray;

    #[test]
    fn new_rejects_zero_and_odd_sizes() {
        assert!(matches!(
            Block2Array::new(0),
            Err(ArrayError::InvalidSize { n: 0, .. })
        ));
        assert!(matches!(
            Block2Array::new(7),
            Err(ArrayError::InvalidSize { n: 7, .. })
        ));
        assert!(Block2Array::new(8).is_ok());
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        assert!(matches!(
            a.read(8),
            Err(ArrayError::IndexOutOfRange { index: 8, len: 8 })
        ));
        assert!(matches!(
            a.write(8, 1),
            Err(ArrayError::IndexOutOfRange { index: 8, len: 8 })
        ));
    }

    #[test]
    fn init_is_boundary_reset_only() {
        let mut a = Block2Array::new(1 << 16).unwrap();
        a.init(5);
        // No cell was touched: the whole buffer still holds construction
        // zeroes, yet every logical read sees the fill value.
        assert!(a.a.iter().all(|&c| c == 0));
        assert_eq!(a.read(0).unwrap(), 5);
        assert_eq!(a.read((1 << 16) - 1).unwrap(), 5);
    }

    #[test]
    fn write_to_unwritten_block_forms_chain() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        // Index 5 lives in block 2, well past the boundary at 0: the
        // write must promote a block and chain it to block 2.
        a.write(5, 99).unwrap();
        assert_eq!(a.b, 1);
        assert_eq!(a.chained_to(2), Some(0));
        assert_eq!(a.chained_to(0), Some(2));
        assert_eq!(a.read(5).unwrap(), 99);
        assert_eq!(a.read(4).unwrap(), 0);
    }

    #[test]
    fn boundary_block_write_claims_itself() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(3);
        // Index 0 is in the boundary block: extend promotes block 0 and
        // hands it straight back, no chain needed.
        a.write(0, 11).unwrap();
        assert_eq!(a.b, 1);
        assert_eq!(a.chained_to(0), None);
        assert_eq!(a.read(0).unwrap(), 11);
        assert_eq!(a.read(1).unwrap(), 3);
    }

    #[test]
    fn chained_block_second_cell_reads_in_place() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        a.write(5, 99).unwrap();
        a.write(4, 44).unwrap();
        // Block 2 is chained; offset 0 routes through the partner while
        // offset 1 stays physically at index 5.
        assert!(a.chained_to(2).is_some());
        assert_eq!(a.a[5], 99);
        assert_eq!(a.read(5).unwrap(), 99);
        assert_eq!(a.read(4).unwrap(), 44);
    }

    #[test]
    fn sequential_writes_saturate_boundary() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        for i in 0..8 {
            a.write(i, (i * i) as Cell).unwrap();
        }
        assert_eq!(a.b, 4);
        for i in 0..8 {
            assert_eq!(a.read(i).unwrap(), (i * i) as Cell);
        }
        for bi in 0..4 {
            assert_eq!(a.chained_to(bi), None);
        }
    }

    #[test]
    fn reinit_forgets_all_writes() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(-1);
        a.write(0, 10).unwrap();
        a.write(7, 20).unwrap();
        a.init(3);
        for i in 0..8 {
            assert_eq!(a.read(i).unwrap(), 3);
        }
    }

    #[test]
    fn counters_track_structure_work() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        a.reset_counters();
        for (i, v) in [(0usize, 10), (2, 20), (4, 30), (6, 40)] {
            a.write(i, v).unwrap();
        }
        let c = a.counters();
        assert_eq!(c.writes, 4);
        assert!(c.relocations + c.conversions <= 4 * c.writes);
        assert_eq!(a.verify_correctness(), Ok(()));
    }

    #[test]
    fn verification_sweep_passes_after_churn() {
        let mut a = Block2Array::new(16).unwrap();
        a.enable_verification().unwrap();
        a.init(9);
        for i in (0..16).rev() {
            a.write(i, i as Cell - 8).unwrap();
        }
        a.init(-5);
        a.write(3, 7).unwrap();
        a.write(12, 7).unwrap();
        assert_eq!(a.verify_correctness(), Ok(()));
    }

    #[test]
    fn aligned_user_values_cannot_fake_chains() {
        let mut a = Block2Array::new(8).unwrap();
        a.init(0);
        // Write block-aligned in-range indices as user data everywhere;
        // reads must still come back verbatim.
        for i in 0..8 {
            a.write(i, ((i / 2) * 2) as Cell).unwrap();
        }
        for i in 0..8 {
            assert_eq!(a.read(i).unwrap(), ((i / 2) * 2) as Cell);
        }
        assert_eq!(a.check_chains(), Ok(()));
    }

    #[test]
    fn compliance_suite() {
        compliance::run_full_compliance(|| Block2Array::new(8).unwrap());
        compliance::run_full_compliance(|| Block2Array::new(32).unwrap());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// One user-visible operation in a generated workload.
        #[derive(Clone, Copy, Debug)]
        enum Op {
            Init(Cell),
            Read(usize),
            Write(usize, Cell),
        }

        fn arb_op(n: usize) -> impl Strategy<Value = Op> {
            prop_oneof![
                (-1000i64..=1000).prop_map(Op::Init),
                (0..n).prop_map(Op::Read),
                ((0..n), -1000i64..=1000).prop_map(|(i, v)| Op::Write(i, v)),
            ]
        }

        proptest! {
            #[test]
            fn agrees_with_baseline(
                ops in proptest::collection::vec(arb_op(16), 1..200),
            ) {
                let mut dut = Block2Array::new(16).unwrap();
                let mut reference = VecArray::new(16).unwrap();
                for op in ops {
                    match op {
                        Op::Init(v) => {
                            dut.init(v);
                            reference.init(v);
                        }
                        Op::Read(i) => {
                            prop_assert_eq!(dut.read(i).unwrap(), reference.read(i).unwrap());
                        }
                        Op::Write(i, v) => {
                            dut.write(i, v).unwrap();
                            reference.write(i, v).unwrap();
                        }
                    }
                }
                for i in 0..16 {
                    prop_assert_eq!(dut.read(i).unwrap(), reference.read(i).unwrap());
                }
                prop_assert_eq!(dut.check_chains(), Ok(()));
            }

            #[test]
            fn chain_relation_stays_a_matching(
                writes in proptest::collection::vec((0usize..32, -1000i64..=1000), 1..100),
            ) {
                let mut a = Block2Array::new(32).unwrap();
                a.init(0);
                for (i, v) in writes {
                    a.write(i, v).unwrap();
                    // Every chain is reciprocal, and partners are unique.
                    let mut seen = std::collections::HashSet::new();
                    for bi in 0..16 {
                        if let Some(bj) = a.chained_to(bi) {
                            prop_assert_eq!(a.chained_to(bj), Some(bi));
                            if bi < bj {
                                prop_assert!(seen.insert((bi, bj)));
                            }
                        }
                    }
                }
            }

            #[test]
            fn counters_never_decrease(
                writes in proptest::collection::vec((0usize..16, -1000i64..=1000), 1..50),
            ) {
                let mut a = Block2Array::new(16).unwrap();
                a.init(0);
                let mut prev = a.counters();
                for (i, v) in writes {
                    a.write(i, v).unwrap();
                    let cur = a.counters();
                    prop_assert!(cur.writes >= prev.writes);
                    prop_assert!(cur.relocations >= prev.relocations);
                    prop_assert!(cur.conversions >= prev.conversions);
                    prev = cur;
                }
            }
        }
    }
}
