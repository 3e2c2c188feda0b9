//! Workload scenario catalogue and deterministic operation streams.
//!
//! Scenario labels are stable strings shared with the cross-language
//! result pipeline (`INIT_ONLY`, `MIXED_R90W10`, ...). Index and op-kind
//! streams are generated up front from a seeded ChaCha8 RNG so the timed
//! region of a run contains no stream construction, and identical seeds
//! reproduce identical workloads across implementations.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use tabula_core::Cell;

/// Cap on the operation count of any single run.
pub const MAX_OPS: usize = 1_000_000;

/// One benchmark workload shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// A single `init(42)`; the run time is the recorded init time.
    InitOnly,
    /// `init(123)` then uniform-random reads of untouched cells.
    ReadUnwritten,
    /// `init(0)` then one write per index in ascending order.
    WriteSequential,
    /// `init(0)` then uniform-random writes.
    WriteRandom,
    /// `init(42)` then a read/write mix at the given read percentage.
    Mixed {
        /// Percentage of operations that are reads (the rest write).
        read_pct: u8,
    },
    /// `init(0)` then writes that hit the first tenth of the array half
    /// the time.
    AdversarialHotspot,
}

impl Scenario {
    /// Every scenario the sweep runs, in output order.
    pub const ALL: [Scenario; 11] = [
        Scenario::InitOnly,
        Scenario::ReadUnwritten,
        Scenario::WriteSequential,
        Scenario::WriteRandom,
        Scenario::Mixed { read_pct: 90 },
        Scenario::Mixed { read_pct: 80 },
        Scenario::Mixed { read_pct: 70 },
        Scenario::Mixed { read_pct: 50 },
        Scenario::Mixed { read_pct: 30 },
        Scenario::Mixed { read_pct: 10 },
        Scenario::AdversarialHotspot,
    ];

    /// Stable scenario label for CSV output.
    pub fn label(&self) -> String {
        match self {
            Scenario::InitOnly => "INIT_ONLY".to_owned(),
            Scenario::ReadUnwritten => "READ_UNWRITTEN".to_owned(),
            Scenario::WriteSequential => "WRITE_SEQUENTIAL".to_owned(),
            Scenario::WriteRandom => "WRITE_RANDOM".to_owned(),
            Scenario::Mixed { read_pct } => {
                format!("MIXED_R{read_pct}W{}", 100 - read_pct)
            }
            Scenario::AdversarialHotspot => "ADVERSARIAL_HOTSPOT".to_owned(),
        }
    }

    /// Parse a scenario label; `None` for unknown strings.
    pub fn parse(s: &str) -> Option<Scenario> {
        match s {
            "INIT_ONLY" => Some(Scenario::InitOnly),
            "READ_UNWRITTEN" => Some(Scenario::ReadUnwritten),
            "WRITE_SEQUENTIAL" => Some(Scenario::WriteSequential),
            "WRITE_RANDOM" => Some(Scenario::WriteRandom),
            "ADVERSARIAL_HOTSPOT" => Some(Scenario::AdversarialHotspot),
            _ => {
                let rest = s.strip_prefix("MIXED_R")?;
                let (read, write) = rest.split_once('W')?;
                let read_pct: u8 = read.parse().ok()?;
                let write_pct: u8 = write.parse().ok()?;
                (read_pct <= 100 && u32::from(read_pct) + u32::from(write_pct) == 100)
                    .then_some(Scenario::Mixed { read_pct })
            }
        }
    }

    /// Number of timed operations this scenario issues at array size `n`.
    pub fn ops_in_run(&self, n: usize) -> usize {
        match self {
            Scenario::InitOnly => 1,
            Scenario::ReadUnwritten => MAX_OPS.min(n.saturating_mul(10)),
            Scenario::WriteSequential => n,
            Scenario::WriteRandom
            | Scenario::Mixed { .. }
            | Scenario::AdversarialHotspot => MAX_OPS.min(n),
        }
    }
}

/// Draw a workload value, uniform in `[-1000, 1000]`.
pub fn random_value(rng: &mut ChaCha8Rng) -> Cell {
    rng.gen_range(-1000..=1000)
}

/// Pre-generate `m` uniform indices in `[0, n)`.
pub fn index_stream(rng: &mut ChaCha8Rng, m: usize, n: usize) -> Vec<usize> {
    (0..m).map(|_| rng.gen_range(0..n)).collect()
}

/// Pre-generate `m` op kinds for a mixed run: `true` means read.
pub fn op_stream(rng: &mut ChaCha8Rng, m: usize, read_pct: u8) -> Vec<bool> {
    (0..m)
        .map(|_| rng.gen_range(0..100u32) < u32::from(read_pct))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn labels_round_trip_through_parse() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::parse(&scenario.label()), Some(scenario));
        }
    }

    #[test]
    fn parse_rejects_malformed_labels() {
        assert_eq!(Scenario::parse("MIXED_R90W20"), None);
        assert_eq!(Scenario::parse("MIXED_R101W-1"), None);
        assert_eq!(Scenario::parse("MIXED_90_10"), None);
        assert_eq!(Scenario::parse("WARMUP"), None);
    }

    #[test]
    fn op_counts_respect_the_cap() {
        assert_eq!(Scenario::InitOnly.ops_in_run(50_000), 1);
        assert_eq!(Scenario::ReadUnwritten.ops_in_run(1000), 10_000);
        assert_eq!(Scenario::ReadUnwritten.ops_in_run(10_000_000), MAX_OPS);
        assert_eq!(Scenario::WriteSequential.ops_in_run(1234), 1234);
        assert_eq!(Scenario::WriteRandom.ops_in_run(10_000_000), MAX_OPS);
    }

    #[test]
    fn streams_are_seed_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(index_stream(&mut a, 100, 64), index_stream(&mut b, 100, 64));
        assert_eq!(op_stream(&mut a, 100, 70), op_stream(&mut b, 100, 70));
        assert_eq!(random_value(&mut a), random_value(&mut b));
    }

    #[test]
    fn mixed_ratio_is_roughly_honored() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ops = op_stream(&mut rng, 10_000, 90);
        let reads = ops.iter().filter(|&&r| r).count();
        assert!((8_500..=9_500).contains(&reads), "reads={reads}");
    }
}
