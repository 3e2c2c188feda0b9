//! Benchmark harness for the tabula array backends.
//!
//! Provides the workload scenario catalogue, a timed scenario runner over
//! any [`tabula_core::InitializableArray`], CSV result records, and the
//! randomized verification driver used by the sweep binary's `--verify`
//! mode. Criterion micro-benchmarks live in `benches/`; the CSV sweep
//! binary lives in `src/bin/sweep.rs`.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod report;
pub mod runner;
pub mod scenario;

pub use report::{write_header, write_record, RunRecord};
pub use runner::{
    build_backend, run_impl, run_scenario, run_scenario_direct, verify_backend, ImplKind,
    RunOutcome,
};
pub use scenario::Scenario;
