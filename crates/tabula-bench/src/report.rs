//! CSV result records.
//!
//! One row per scenario run, in the column order shared with the
//! cross-language result pipeline. Rows are written through the `csv`
//! crate; timestamps are ISO-8601 UTC with second precision.

use std::io::Write;

use chrono::Utc;

use crate::runner::RunOutcome;

/// CSV column order.
const HEADER: [&str; 12] = [
    "timestamp_iso",
    "impl_name",
    "scenario",
    "N",
    "seed",
    "rep_id",
    "ops_in_run",
    "total_time_ns",
    "ns_per_op",
    "init_time_ns_if_recorded",
    "relocations_count",
    "conversions_count",
];

/// One result row.
#[derive(Clone, Debug)]
pub struct RunRecord {
    /// ISO-8601 UTC timestamp taken when the run started.
    pub timestamp_iso: String,
    /// Implementation label (`std_vector`, `sec3`, ...).
    pub impl_name: String,
    /// Scenario label (`INIT_ONLY`, `MIXED_R90W10`, ...).
    pub scenario: String,
    /// Array size.
    pub n: usize,
    /// Workload seed.
    pub seed: u64,
    /// 1-based repetition number.
    pub rep_id: u32,
    /// Measured outcome of the run.
    pub outcome: RunOutcome,
}

impl RunRecord {
    /// Assemble a record from run parameters and a measured outcome.
    pub fn new(
        impl_name: &str,
        scenario: &str,
        n: usize,
        seed: u64,
        rep_id: u32,
        outcome: RunOutcome,
    ) -> Self {
        Self {
            timestamp_iso: now_iso(),
            impl_name: impl_name.to_owned(),
            scenario: scenario.to_owned(),
            n,
            seed,
            rep_id,
            outcome,
        }
    }
}

/// Current time as ISO-8601 UTC with second precision.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Write the CSV header row.
pub fn write_header<W: Write>(out: &mut csv::Writer<W>) -> csv::Result<()> {
    out.write_record(HEADER)
}

/// Write one result row.
pub fn write_record<W: Write>(out: &mut csv::Writer<W>, record: &RunRecord) -> csv::Result<()> {
    out.write_record([
        record.timestamp_iso.clone(),
        record.impl_name.clone(),
        record.scenario.clone(),
        record.n.to_string(),
        record.seed.to_string(),
        record.rep_id.to_string(),
        record.outcome.ops_in_run.to_string(),
        record.outcome.total_time_ns.to_string(),
        format!("{:.4}", record.outcome.ns_per_op),
        record.outcome.init_time_ns.to_string(),
        record.outcome.counters.relocations.to_string(),
        record.outcome.counters.conversions.to_string(),
    ])
}
