//! Timed scenario execution and the randomized verification driver.

use std::hint::black_box;
use std::time::Instant;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tabula_array::{Block2Array, Block4Array, VecArray};
use tabula_core::{ArrayError, Cell, InitializableArray, OpCounters};

use crate::scenario::{self, Scenario};

/// The selectable implementations.
///
/// `StdVectorDirect` is the raw-buffer path: the same workloads run
/// against a bare `Vec<Cell>` with no trait object in the hot loop, so
/// the dispatch overhead of the polymorphic baseline stays visible in
/// the results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImplKind {
    /// Polymorphic baseline buffer.
    StdVector,
    /// Two-cell-block in-place scheme.
    Sec3,
    /// Four-cell-block in-place scheme with stashed metadata.
    Sec4,
    /// Raw buffer without trait dispatch.
    StdVectorDirect,
}

impl ImplKind {
    /// Every implementation, in default sweep order.
    pub const ALL: [ImplKind; 4] = [
        ImplKind::StdVector,
        ImplKind::Sec3,
        ImplKind::Sec4,
        ImplKind::StdVectorDirect,
    ];

    /// Stable implementation label for CSV output and CLI selection.
    pub fn label(&self) -> &'static str {
        match self {
            ImplKind::StdVector => "std_vector",
            ImplKind::Sec3 => "sec3",
            ImplKind::Sec4 => "sec4",
            ImplKind::StdVectorDirect => "std_vector_direct",
        }
    }

    /// Parse an implementation label; `None` for unknown strings.
    pub fn parse(s: &str) -> Option<ImplKind> {
        ImplKind::ALL.into_iter().find(|k| k.label() == s)
    }

    /// The divisor array sizes must satisfy for this implementation.
    pub fn size_multiple(&self) -> usize {
        match self {
            ImplKind::StdVector | ImplKind::StdVectorDirect => 1,
            ImplKind::Sec3 => 2,
            ImplKind::Sec4 => 4,
        }
    }
}

/// Construct the trait-backed implementation behind `kind`.
///
/// `StdVectorDirect` maps to the same buffer as `StdVector`; the direct
/// hot loops live in [`run_scenario_direct`].
pub fn build_backend(kind: ImplKind, n: usize) -> Result<Box<dyn InitializableArray>, ArrayError> {
    Ok(match kind {
        ImplKind::StdVector | ImplKind::StdVectorDirect => Box::new(VecArray::new(n)?),
        ImplKind::Sec3 => Box::new(Block2Array::new(n)?),
        ImplKind::Sec4 => Box::new(Block4Array::new(n)?),
    })
}

/// Measured results of one scenario run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Operations issued inside the timed region.
    pub ops_in_run: usize,
    /// Wall-clock duration of the timed region, in nanoseconds.
    pub total_time_ns: u128,
    /// `total_time_ns / ops_in_run`.
    pub ns_per_op: f64,
    /// Duration of the `init` call when the scenario times it, else 0.
    pub init_time_ns: u128,
    /// Counter snapshot taken after the timed region.
    pub counters: OpCounters,
}

/// Run one implementation/scenario pair at size `n`.
pub fn run_impl(
    kind: ImplKind,
    scenario: Scenario,
    n: usize,
    seed: u64,
) -> Result<RunOutcome, ArrayError> {
    match kind {
        ImplKind::StdVectorDirect => run_scenario_direct(scenario, n, seed),
        _ => {
            let mut array = build_backend(kind, n)?;
            run_scenario(array.as_mut(), scenario, seed)
        }
    }
}

/// Execute `scenario` against `array`, timing only the operation loop.
///
/// Index and op-kind streams are generated before the clock starts; read
/// results are folded into a sink passed through `black_box` so the loop
/// cannot be elided.
pub fn run_scenario(
    array: &mut dyn InitializableArray,
    scenario: Scenario,
    seed: u64,
) -> Result<RunOutcome, ArrayError> {
    let n = array.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    array.reset_counters();

    let (ops_in_run, total_time_ns, init_time_ns) = match scenario {
        Scenario::InitOnly => {
            let start = Instant::now();
            array.init(42);
            let elapsed = start.elapsed().as_nanos();
            (1, elapsed, elapsed)
        }
        Scenario::ReadUnwritten => {
            array.init(123);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let mut sink: Cell = 0;
            let start = Instant::now();
            for &i in &indices {
                sink ^= array.read(i)?;
            }
            let elapsed = start.elapsed().as_nanos();
            black_box(sink);
            (m, elapsed, 0)
        }
        Scenario::WriteSequential => {
            array.init(0);
            let start = Instant::now();
            for i in 0..n {
                array.write(i, i as Cell)?;
            }
            (n, start.elapsed().as_nanos(), 0)
        }
        Scenario::WriteRandom => {
            array.init(0);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let start = Instant::now();
            for &i in &indices {
                let v = scenario::random_value(&mut rng);
                array.write(i, v)?;
            }
            (m, start.elapsed().as_nanos(), 0)
        }
        Scenario::Mixed { read_pct } => {
            array.init(42);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let ops = scenario::op_stream(&mut rng, m, read_pct);
            let mut sink: Cell = 0;
            let start = Instant::now();
            for t in 0..m {
                if ops[t] {
                    sink ^= array.read(indices[t])?;
                } else {
                    let v = scenario::random_value(&mut rng);
                    array.write(indices[t], v)?;
                }
            }
            let elapsed = start.elapsed().as_nanos();
            black_box(sink);
            (m, elapsed, 0)
        }
        Scenario::AdversarialHotspot => {
            array.init(0);
            let m = scenario.ops_in_run(n);
            let hotspot = (n / 10).max(1);
            let start = Instant::now();
            for _ in 0..m {
                let i = if rng.gen_range(0..2) == 0 {
                    rng.gen_range(0..hotspot)
                } else {
                    rng.gen_range(0..n)
                };
                let v = scenario::random_value(&mut rng);
                array.write(i, v)?;
            }
            (m, start.elapsed().as_nanos(), 0)
        }
    };

    let ns_per_op = if ops_in_run > 0 {
        total_time_ns as f64 / ops_in_run as f64
    } else {
        0.0
    };
    Ok(RunOutcome {
        ops_in_run,
        total_time_ns,
        ns_per_op,
        init_time_ns,
        counters: array.counters(),
    })
}

/// Allocate the direct path's buffer, surfacing failure as `OutOfMemory`.
fn direct_buf(n: usize) -> Result<Vec<Cell>, ArrayError> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(n).is_err() {
        return Err(ArrayError::OutOfMemory {
            requested_bytes: n.saturating_mul(std::mem::size_of::<Cell>()),
        });
    }
    buf.resize(n, 0);
    Ok(buf)
}

/// Execute `scenario` against a bare `Vec<Cell>` with no dispatch.
///
/// Same workloads and stream generation as [`run_scenario`]; counters
/// are reported as zero.
pub fn run_scenario_direct(
    scenario: Scenario,
    n: usize,
    seed: u64,
) -> Result<RunOutcome, ArrayError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut a = direct_buf(n)?;

    let (ops_in_run, total_time_ns, init_time_ns) = match scenario {
        Scenario::InitOnly => {
            let start = Instant::now();
            a.fill(42);
            let elapsed = start.elapsed().as_nanos();
            (1, elapsed, elapsed)
        }
        Scenario::ReadUnwritten => {
            a.fill(123);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let mut sink: Cell = 0;
            let start = Instant::now();
            for &i in &indices {
                sink ^= a[i];
            }
            let elapsed = start.elapsed().as_nanos();
            black_box(sink);
            (m, elapsed, 0)
        }
        Scenario::WriteSequential => {
            a.fill(0);
            let start = Instant::now();
            for i in 0..n {
                a[i] = i as Cell;
            }
            (n, start.elapsed().as_nanos(), 0)
        }
        Scenario::WriteRandom => {
            a.fill(0);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let start = Instant::now();
            for &i in &indices {
                a[i] = scenario::random_value(&mut rng);
            }
            (m, start.elapsed().as_nanos(), 0)
        }
        Scenario::Mixed { read_pct } => {
            a.fill(42);
            let m = scenario.ops_in_run(n);
            let indices = scenario::index_stream(&mut rng, m, n);
            let ops = scenario::op_stream(&mut rng, m, read_pct);
            let mut sink: Cell = 0;
            let start = Instant::now();
            for t in 0..m {
                if ops[t] {
                    sink ^= a[indices[t]];
                } else {
                    a[indices[t]] = scenario::random_value(&mut rng);
                }
            }
            let elapsed = start.elapsed().as_nanos();
            black_box(sink);
            (m, elapsed, 0)
        }
        Scenario::AdversarialHotspot => {
            a.fill(0);
            let m = scenario.ops_in_run(n);
            let hotspot = (n / 10).max(1);
            let start = Instant::now();
            for _ in 0..m {
                let i = if rng.gen_range(0..2) == 0 {
                    rng.gen_range(0..hotspot)
                } else {
                    rng.gen_range(0..n)
                };
                a[i] = scenario::random_value(&mut rng);
            }
            (m, start.elapsed().as_nanos(), 0)
        }
    };

    let ns_per_op = if ops_in_run > 0 {
        total_time_ns as f64 / ops_in_run as f64
    } else {
        0.0
    };
    Ok(RunOutcome {
        ops_in_run,
        total_time_ns,
        ns_per_op,
        init_time_ns,
        counters: OpCounters::default(),
    })
}

/// Drive `ops` random operations against `kind` and a verified baseline,
/// comparing every read, then sweep both shadows.
///
/// Only the in-place schemes are meaningful targets; the baseline *is*
/// the reference.
pub fn verify_backend(kind: ImplKind, n: usize, seed: u64, ops: usize) -> Result<(), String> {
    if !matches!(kind, ImplKind::Sec3 | ImplKind::Sec4) {
        return Err(format!(
            "verification target must be sec3 or sec4, got {}",
            kind.label()
        ));
    }
    let mut dut = build_backend(kind, n).map_err(|e| e.to_string())?;
    dut.enable_verification().map_err(|e| e.to_string())?;
    let mut reference = VecArray::new(n).map_err(|e| e.to_string())?;
    reference.enable_verification().map_err(|e| e.to_string())?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for op in 0..ops {
        match rng.gen_range(0..3) {
            0 => {
                let v: Cell = rng.gen_range(-1000..=1000);
                reference.init(v);
                dut.init(v);
            }
            1 => {
                let i = rng.gen_range(0..n);
                let expected = reference.read(i).map_err(|e| e.to_string())?;
                let actual = dut.read(i).map_err(|e| e.to_string())?;
                if expected != actual {
                    return Err(format!(
                        "read({i}) diverged at op {op}: reference={expected}, {}={actual}\n{}",
                        dut.name(),
                        dut.dump_state(i)
                    ));
                }
            }
            _ => {
                let i = rng.gen_range(0..n);
                let v: Cell = rng.gen_range(-1000..=1000);
                reference.write(i, v).map_err(|e| e.to_string())?;
                dut.write(i, v).map_err(|e| e.to_string())?;
            }
        }
    }

    dut.verify_correctness().map_err(|failure| {
        let focus = match failure {
            tabula_core::VerifyFailure::ValueMismatch { index, .. } => index,
            tabula_core::VerifyFailure::MetadataMismatch { index, .. } => index,
            tabula_core::VerifyFailure::ChainAsymmetry { .. } => 0,
        };
        format!("{failure}\n{}", dut.dump_state(focus))
    })
}
