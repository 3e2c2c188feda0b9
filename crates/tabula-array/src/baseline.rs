//! Plain-buffer baseline backend.

use std::fmt::Write as _;

use tabula_core::{ArrayError, Cell, InitializableArray, OpCounters, VerifyFailure};

use crate::shadow::ShadowOracle;
use crate::zeroed_buf;

/// A contiguous buffer with straightforward semantics.
///
/// `init` fills every cell in Θ(N); `read` and `write` touch the cell
/// directly. Serves as the correctness reference and the performance
/// baseline; the Θ(N) init cost is deliberately paid inside `init` so
/// reported init times stay honest.
///
/// # Examples
///
/// ```
/// use tabula_array::VecArray;
/// use tabula_core::InitializableArray;
///
/// let mut a = VecArray::new(8).unwrap();
/// a.init(7);
/// a.write(3, 42).unwrap();
/// assert_eq!(a.read(3).unwrap(), 42);
/// assert_eq!(a.read(4).unwrap(), 7);
/// ```
#[derive(Clone, Debug)]
pub struct VecArray {
    data: Vec<Cell>,
    counters: OpCounters,
    shadow: Option<ShadowOracle>,
}

impl VecArray {
    /// Create a zero-initialized buffer of `n` cells.
    ///
    /// Returns [`ArrayError::InvalidSize`] for `n == 0` and
    /// [`ArrayError::OutOfMemory`] on allocation failure.
    pub fn new(n: usize) -> Result<Self, ArrayError> {
        if n == 0 {
            return Err(ArrayError::InvalidSize { n, multiple_of: 1 });
        }
        Ok(Self {
            data: zeroed_buf(n)?,
            counters: OpCounters::default(),
            shadow: None,
        })
    }
}

impl InitializableArray for VecArray {
    fn name(&self) -> &'static str {
        "std_vector"
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn init(&mut self, v: Cell) {
        self.counters.inits += 1;
        self.data.fill(v);
        if let Some(shadow) = self.shadow.as_mut() {
            shadow.on_init(v);
        }
    }

    fn read(&mut self, i: usize) -> Result<Cell, ArrayError> {
        self.counters.reads += 1;
        self.data
            .get(i)
            .copied()
            .ok_or(ArrayError::IndexOutOfRange {
                index: i,
                len: self.data.len(),
            })
    }

    fn write(&mut self, i: usize, v: Cell) -> Result<(), ArrayError> {
        self.counters.writes += 1;
        let len = self.data.len();
        let cell = self
            .data
            .get_mut(i)
            .ok_or(ArrayError::IndexOutOfRange { index: i, len })?;
        *cell = v;
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
            self.shadow = Some(ShadowOracle::new(self.data.len())?);
        }
        Ok(())
    }

    fn verify_correctness(&mut self) -> Result<(), VerifyFailure> {
        let Some(shadow) = self.shadow.as_ref() else {
            return Ok(());
        };
        let data = &self.data;
        shadow.check_against(|i| data[i])
    }

    fn dump_state(&self, focus: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "std_vector state: n={} focus={focus}", self.data.len());
        if let Some(&v) = self.data.get(focus) {
            let _ = writeln!(out, "  A[{focus}] = {v}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;

    #[test]
    fn new_zero_len_returns_error() {
        assert!(matches!(
            VecArray::new(0),
            Err(ArrayError::InvalidSize { n: 0, .. })
        ));
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut a = VecArray::new(4).unwrap();
        assert!(matches!(
            a.read(4),
            Err(ArrayError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert!(matches!(
            a.write(9, 1),
            Err(ArrayError::IndexOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn failed_ops_are_still_counted() {
        let mut a = VecArray::new(4).unwrap();
        let _ = a.read(100);
        let _ = a.write(100, 1);
        assert_eq!(a.counters().reads, 1);
        assert_eq!(a.counters().writes, 1);
    }

    #[test]
    fn structural_counters_stay_zero() {
        let mut a = VecArray::new(8).unwrap();
        a.init(0);
        for i in 0..8 {
            a.write(i, i as Cell).unwrap();
        }
        assert_eq!(a.counters().relocations, 0);
        assert_eq!(a.counters().conversions, 0);
    }

    #[test]
    fn verification_sweep_passes_after_mixed_ops() {
        let mut a = VecArray::new(8).unwrap();
        a.enable_verification().unwrap();
        a.init(3);
        a.write(1, 10).unwrap();
        a.init(-2);
        a.write(5, 20).unwrap();
        assert_eq!(a.verify_correctness(), Ok(()));
    }

    #[test]
    fn compliance_suite() {
        compliance::run_full_compliance(|| VecArray::new(8).unwrap());
    }
}
