//! Benchmark sweep and correctness-verification driver.
//!
//! Default mode runs every selected implementation through the full
//! scenario catalogue at every requested size, appending one CSV row per
//! run. `--verify` runs the randomized shadow-oracle check for one of the
//! in-place schemes instead.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn};

use tabula_bench::report::{write_header, write_record, RunRecord};
use tabula_bench::runner::{run_impl, verify_backend, ImplKind};
use tabula_bench::scenario::Scenario;
use tabula_core::ArrayError;

/// Operation count for a `--verify` run.
const VERIFY_OPS: usize = 1000;

/// Default array size for a `--verify` run.
const DEFAULT_VERIFY_N: usize = 10_000;

fn print_usage() {
    println!(
        "Usage:\n  \
         sweep [--Ns 10k,100k,1m] [--reps 3] [--seed 42]\n        \
         [--impls std_vector,sec3,sec4,std_vector_direct] [--outfile results.csv]\n  \
         sweep --verify <sec3|sec4> [--n 10000] [--seed 42]\n\n\
         Sizes accept k/m/g suffixes (decimal)."
    );
}

#[derive(Debug, Clone)]
struct Config {
    sizes: Vec<usize>,
    reps: u32,
    seed: u64,
    impls: Vec<ImplKind>,
    outfile: PathBuf,
    verify: Option<ImplKind>,
    verify_n: usize,
}

impl Config {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut sizes = vec![10_000, 100_000, 1_000_000];
        let mut reps = 3u32;
        let mut seed = 42u64;
        let mut impls: Vec<ImplKind> = ImplKind::ALL.to_vec();
        let mut outfile = PathBuf::from("results.csv");
        let mut verify = None;
        let mut verify_n = DEFAULT_VERIFY_N;

        let mut index = 0;
        while index < args.len() {
            match args[index].as_str() {
                "--Ns" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --Ns")?;
                    sizes = parse_sizes(value)?;
                }
                "--reps" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --reps")?;
                    reps = value
                        .parse()
                        .map_err(|_| format!("invalid repetition count '{value}'"))?;
                }
                "--seed" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --seed")?;
                    seed = value
                        .parse()
                        .map_err(|_| format!("invalid seed '{value}'"))?;
                }
                "--impls" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --impls")?;
                    impls = value
                        .split(',')
                        .filter(|tok| !tok.is_empty())
                        .map(|tok| {
                            ImplKind::parse(tok).ok_or_else(|| format!("unknown impl '{tok}'"))
                        })
                        .collect::<Result<_, _>>()?;
                    if impls.is_empty() {
                        return Err("--impls selected no implementations".to_owned());
                    }
                }
                "--outfile" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --outfile")?;
                    outfile = PathBuf::from(value);
                }
                "--verify" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --verify")?;
                    let kind = ImplKind::parse(value)
                        .ok_or_else(|| format!("unknown impl '{value}'"))?;
                    verify = Some(kind);
                }
                "--n" => {
                    index += 1;
                    let value = args.get(index).ok_or("missing value for --n")?;
                    verify_n = value
                        .parse()
                        .map_err(|_| format!("invalid size '{value}'"))?;
                }
                other => return Err(format!("unknown argument '{other}'")),
            }
            index += 1;
        }

        Ok(Self {
            sizes,
            reps,
            seed,
            impls,
            outfile,
            verify,
            verify_n,
        })
    }
}

/// Parse a comma-separated size list with decimal `k`/`m`/`g` suffixes.
fn parse_sizes(s: &str) -> Result<Vec<usize>, String> {
    let mut out = Vec::new();
    for tok in s.split(',') {
        if tok.is_empty() {
            continue;
        }
        let (digits, mult) = match tok.chars().next_back() {
            Some('k' | 'K') => (&tok[..tok.len() - 1], 1e3),
            Some('m' | 'M') => (&tok[..tok.len() - 1], 1e6),
            Some('g' | 'G') => (&tok[..tok.len() - 1], 1e9),
            _ => (tok, 1.0),
        };
        let value: f64 = digits
            .parse()
            .map_err(|_| format!("invalid size '{tok}'"))?;
        if !value.is_finite() || value < 1.0 {
            return Err(format!("invalid size '{tok}'"));
        }
        out.push((value * mult) as usize);
    }
    if out.is_empty() {
        return Err("empty size list".to_owned());
    }
    Ok(out)
}

fn run_sweep(config: &Config) -> Result<(), String> {
    let mut out = csv::Writer::from_path(&config.outfile)
        .map_err(|e| format!("cannot open {}: {e}", config.outfile.display()))?;
    write_header(&mut out).map_err(|e| e.to_string())?;

    for &kind in &config.impls {
        for &n in &config.sizes {
            if n == 0 || n % kind.size_multiple() != 0 {
                continue;
            }
            for scenario in Scenario::ALL {
                for rep in 1..=config.reps {
                    info!(
                        "running {} {} N={n} seed={} rep={rep}",
                        kind.label(),
                        scenario.label(),
                        config.seed
                    );
                    match run_impl(kind, scenario, n, config.seed) {
                        Ok(outcome) => {
                            let record = RunRecord::new(
                                kind.label(),
                                &scenario.label(),
                                n,
                                config.seed,
                                rep,
                                outcome,
                            );
                            write_record(&mut out, &record).map_err(|e| e.to_string())?;
                            // Flush per row so a crashed sweep keeps its
                            // partial results.
                            out.flush().map_err(|e| e.to_string())?;
                        }
                        Err(err @ ArrayError::OutOfMemory { .. }) => {
                            warn!("skipping {} N={n}: {err}", kind.label());
                        }
                        Err(err) => {
                            warn!(
                                "run failed for {} {} N={n}: {err}",
                                kind.label(),
                                scenario.label()
                            );
                        }
                    }
                }
            }
        }
    }

    info!("sweep finished, results in {}", config.outfile.display());
    Ok(())
}

fn run_verification(config: &Config, kind: ImplKind) -> ExitCode {
    info!(
        "verifying {} with N={} seed={}",
        kind.label(),
        config.verify_n,
        config.seed
    );
    match verify_backend(kind, config.verify_n, config.seed, VERIFY_OPS) {
        Ok(()) => {
            info!("verification of {} passed", kind.label());
            ExitCode::SUCCESS
        }
        Err(report) => {
            error!("verification of {} failed:\n{report}", kind.label());
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let config = match Config::parse(&args) {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if let Some(kind) = config.verify {
        return run_verification(&config, kind);
    }

    match run_sweep(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}
