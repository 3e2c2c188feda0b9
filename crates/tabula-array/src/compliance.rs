//! Array contract compliance test helpers.
//!
//! These functions verify that a backend satisfies the algebraic laws of
//! the `InitializableArray` contract. Reused across all backend test
//! modules (`VecArray`, `Block2Array`, `Block4Array`).

use tabula_core::{Cell, InitializableArray};

/// Assert that after `init(v)` every index reads `v`.
pub(crate) fn assert_init_fills(arr: &mut dyn InitializableArray) {
    for v in [7, -3, 0] {
        arr.init(v);
        for i in 0..arr.len() {
            assert_eq!(arr.read(i).unwrap(), v, "init({v}) then read({i})");
        }
    }
}

/// Assert that a written value reads back.
pub(crate) fn assert_write_then_read(arr: &mut dyn InitializableArray) {
    arr.init(0);
    for i in 0..arr.len() {
        let v = 3 * i as Cell + 1;
        arr.write(i, v).unwrap();
        assert_eq!(arr.read(i).unwrap(), v, "write({i}, {v}) then read({i})");
    }
}

/// Assert that writing one index leaves every other index unchanged.
pub(crate) fn assert_write_isolation(arr: &mut dyn InitializableArray) {
    let n = arr.len();
    arr.init(5);
    for target in 0..n {
        let before: Vec<Cell> = (0..n).map(|j| arr.read(j).unwrap()).collect();
        arr.write(target, 99).unwrap();
        for j in 0..n {
            let expected = if j == target { 99 } else { before[j] };
            assert_eq!(
                arr.read(j).unwrap(),
                expected,
                "write({target}) disturbed read({j})"
            );
        }
        arr.write(target, before[target]).unwrap();
    }
}

/// Assert that a second `init` supersedes the first.
pub(crate) fn assert_reinit_overrides(arr: &mut dyn InitializableArray) {
    arr.init(1);
    arr.init(2);
    for i in 0..arr.len() {
        assert_eq!(arr.read(i).unwrap(), 2);
    }
}

/// Assert that `init` logically wipes every earlier write.
pub(crate) fn assert_init_wipes_writes(arr: &mut dyn InitializableArray) {
    arr.init(1);
    for i in 0..arr.len() {
        arr.write(i, 50 + i as Cell).unwrap();
    }
    arr.init(9);
    for i in 0..arr.len() {
        assert_eq!(arr.read(i).unwrap(), 9, "stale write survived init at {i}");
    }
}

/// Assert that counters only grow between resets.
pub(crate) fn assert_counter_monotonicity(arr: &mut dyn InitializableArray) {
    arr.reset_counters();
    let mut prev = arr.counters();
    arr.init(0);
    for i in 0..arr.len() {
        arr.write(i, i as Cell).unwrap();
        let _ = arr.read(i).unwrap();
        let cur = arr.counters();
        assert!(cur.reads >= prev.reads);
        assert!(cur.writes >= prev.writes);
        assert!(cur.inits >= prev.inits);
        assert!(cur.relocations >= prev.relocations);
        assert!(cur.conversions >= prev.conversions);
        prev = cur;
    }
}

/// Assert that the verification sweep passes after a mixed workload.
pub(crate) fn assert_verified_mixed_workload(arr: &mut dyn InitializableArray) {
    arr.enable_verification().unwrap();
    arr.init(42);
    let n = arr.len();
    for i in (0..n).step_by(3) {
        arr.write(i, -(i as Cell)).unwrap();
    }
    arr.init(-7);
    for i in (0..n).rev().step_by(2) {
        arr.write(i, i as Cell * 11).unwrap();
    }
    assert_eq!(arr.verify_correctness(), Ok(()));
}

/// Run every compliance law, each against a fresh instance.
pub(crate) fn run_full_compliance<A, F>(mut make: F)
where
    A: InitializableArray,
    F: FnMut() -> A,
{
    assert_init_fills(&mut make());
    assert_write_then_read(&mut make());
    assert_write_isolation(&mut make());
    assert_reinit_overrides(&mut make());
    assert_init_wipes_writes(&mut make());
    assert_counter_monotonicity(&mut make());
    assert_verified_mixed_workload(&mut make());
}
