// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use rescue_alloc_model::{
    CoveragePolicy, Instance, RunConfig, SolverChoice, WaterSelection,
    generator::{InstanceGenerator, SyntheticConfig},
    report::{SweepEntry, SweepOutcome, SweepReport, default_report_path, write_json},
};
use rescue_alloc_solver::{AllocError, CancellationToken, pipeline};
use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    ops::Range,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

#[derive(Parser, Debug)]
#[command(
    name = "rescue-alloc",
    about = "Allocate rescue craft to shore stations under tidal access constraints"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one optimization and write its report
    Solve(SolveArgs),
    /// Run optimizations over several seeds and zone counts concurrently
    Sweep(SweepArgs),
    /// Write a synthetic instance for later runs
    Generate(GenerateArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum WaterArg {
    NorthSea,
    BalticSea,
    Both,
}

impl From<WaterArg> for WaterSelection {
    fn from(w: WaterArg) -> Self {
        match w {
            WaterArg::NorthSea => WaterSelection::NorthSea,
            WaterArg::BalticSea => WaterSelection::BalticSea,
            WaterArg::Both => WaterSelection::Both,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SolverArg {
    Microlp,
}

impl From<SolverArg> for SolverChoice {
    fn from(s: SolverArg) -> Self {
        match s {
            SolverArg::Microlp => SolverChoice::Microlp,
        }
    }
}

#[derive(Args, Debug)]
struct SyntheticArgs {
    /// Stations of a generated instance
    #[arg(long)]
    stations: Option<usize>,

    /// Raster size of a generated instance before unreachable zones are dropped
    #[arg(long)]
    raw_zones: Option<usize>,
}

impl SyntheticArgs {
    fn config(&self, cfg: &RunConfig) -> SyntheticConfig {
        let defaults = SyntheticConfig::default();
        SyntheticConfig {
            stations: self.stations.unwrap_or(defaults.stations),
            raw_zones: self.raw_zones.unwrap_or(defaults.raw_zones),
            horizon: cfg.horizon,
            ..defaults
        }
    }
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Instance JSON; a synthetic instance is generated when omitted
    #[arg(long, value_name = "FILE")]
    instance: Option<PathBuf>,

    #[command(flatten)]
    synthetic: SyntheticArgs,

    /// Run configuration TOML; command line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    water: Option<WaterArg>,

    #[arg(long, value_enum)]
    solver: Option<SolverArg>,

    #[arg(long)]
    time_limit_secs: Option<f64>,

    /// Allow uncovered zone-windows at this demand-weighted penalty
    #[arg(long)]
    soft_penalty: Option<f64>,
}

#[derive(Args, Debug)]
struct SolveArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long)]
    seed: Option<u64>,

    /// Number of combined zones
    #[arg(long)]
    zones: Option<usize>,

    /// Report path (default results/<water>_<seed>_<zones>.json)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Half-open seed range, for example 0..5
    #[arg(long, value_parser = parse_seed_range, default_value = "0..5")]
    seeds: Range<u64>,

    /// Comma separated numbers of combined zones
    #[arg(long, value_delimiter = ',', default_value = "25,50")]
    zone_counts: Vec<usize>,

    /// Report path (default results/sweep_<water>.json)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    synthetic: SyntheticArgs,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run configuration TOML supplying the horizon
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Instance path (default results/instance_<seed>.json)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn parse_seed_range(s: &str) -> Result<Range<u64>, String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid seed {v:?}: {e}"))
    };
    match s.split_once("..") {
        Some((a, b)) => {
            let (a, b) = (parse(a)?, parse(b)?);
            if a >= b {
                return Err(format!("empty seed range {s}"));
            }
            Ok(a..b)
        }
        None => {
            let a = parse(s)?;
            Ok(a..a.saturating_add(1))
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
    match path {
        Some(p) => Ok(RunConfig::load_from_path(p)?),
        None => Ok(RunConfig::default()),
    }
}

fn run_config(input: &InputArgs) -> anyhow::Result<RunConfig> {
    let mut cfg = load_config(input.config.as_deref())?;
    if let Some(w) = input.water {
        cfg.water = w.into();
    }
    if let Some(s) = input.solver {
        cfg.solver.backend = s.into();
    }
    if let Some(t) = input.time_limit_secs {
        cfg.solver.time_limit_secs = Some(t);
    }
    if let Some(p) = input.soft_penalty {
        cfg.objective.policy = CoveragePolicy::Soft {
            uncovered_penalty: p,
        };
    }
    Ok(cfg)
}

fn read_instance(path: &Path) -> anyhow::Result<Instance> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot read instance {}", path.display()))
}

fn generate_instance(cfg: SyntheticConfig, seed: u64) -> anyhow::Result<Instance> {
    let instance = InstanceGenerator::new(cfg, seed)
        .generate()
        .context("cannot generate synthetic instance")?;
    let stats = instance.stats();
    info!(
        seed,
        stations = stats.station_count(),
        zones = stats.zone_count(),
        fleet = stats.total_fleet(),
        "Generated instance"
    );
    Ok(instance)
}

fn report_failure(err: &AllocError) {
    if let AllocError::ModelInfeasible(e) = err {
        for (zone, incident, window) in e.uncoverable().iter().take(20) {
            error!(%zone, %incident, %window, "No feasible responder");
        }
        if e.uncoverable().len() > 20 {
            error!(more = e.uncoverable().len() - 20, "Further uncoverable responses");
        }
    }
}

fn solve(args: SolveArgs) -> anyhow::Result<()> {
    let mut cfg = run_config(&args.input)?;
    if let Some(seed) = args.seed {
        cfg = cfg.with_seed(seed);
    }
    if let Some(k) = args.zones {
        cfg = cfg.with_target_zones(k);
    }
    let instance = match &args.input.instance {
        Some(path) => read_instance(path)?,
        None => generate_instance(args.input.synthetic.config(&cfg), cfg.seed)?,
    };

    let report = pipeline::run(&instance, &cfg, &CancellationToken::new()).inspect_err(report_failure)?;
    let path = args.output.unwrap_or_else(|| {
        default_report_path(cfg.water, cfg.seed, cfg.cluster.target_zones)
    });
    write_json(&path, &report).with_context(|| format!("cannot write {}", path.display()))?;
    info!(
        path = %path.display(),
        status = %report.run.status,
        objective = report.run.objective,
        deployment_cost = report.plan.deployment_cost().value(),
        "Report written"
    );
    println!("{}", report.plan);
    Ok(())
}

fn sweep(args: SweepArgs) -> anyhow::Result<()> {
    let cfg = run_config(&args.input)?;
    if args.zone_counts.is_empty() {
        bail!("--zone-counts must name at least one zone count");
    }
    let seeds: Vec<u64> = args.seeds.clone().collect();

    let shared = match &args.input.instance {
        Some(path) => Some(read_instance(path)?),
        None => None,
    };
    let mut generated: BTreeMap<u64, Instance> = BTreeMap::new();
    if shared.is_none() {
        for &seed in &seeds {
            generated.insert(seed, generate_instance(args.input.synthetic.config(&cfg), seed)?);
        }
    }

    let jobs: Vec<(u64, usize)> = seeds
        .iter()
        .flat_map(|&s| args.zone_counts.iter().map(move |&k| (s, k)))
        .collect();
    let started = Instant::now();
    let runs: Vec<SweepEntry> = jobs
        .par_iter()
        .map(|&(seed, k)| {
            let run_cfg = cfg.with_seed(seed).with_target_zones(k);
            let instance = shared.as_ref().or_else(|| generated.get(&seed));
            let outcome = match instance {
                Some(instance) => {
                    match pipeline::run(instance, &run_cfg, &CancellationToken::new()) {
                        Ok(report) => SweepOutcome::Solved {
                            report: Box::new(report),
                        },
                        Err(e) => {
                            warn!(seed, k, error = %e, "Sweep run failed");
                            SweepOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    }
                }
                None => SweepOutcome::Failed {
                    error: format!("no instance for seed {seed}"),
                },
            };
            SweepEntry {
                seed,
                target_zones: k,
                outcome,
            }
        })
        .collect();

    let solved = runs
        .iter()
        .filter(|r| matches!(r.outcome, SweepOutcome::Solved { .. }))
        .count();
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from("results").join(format!("sweep_{}.json", cfg.water)));
    let total = runs.len();
    write_json(&path, &SweepReport { runs })
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!(
        path = %path.display(),
        runs = total,
        solved,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Sweep finished"
    );
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let instance = generate_instance(args.synthetic.config(&cfg), args.seed)?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from("results").join(format!("instance_{}.json", args.seed)));
    write_json(&path, &instance).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "Instance written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    enable_tracing();
    match Cli::parse().command {
        Command::Solve(args) => solve(args),
        Command::Sweep(args) => sweep(args),
        Command::Generate(args) => generate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_range_parsing() {
        assert_eq!(parse_seed_range("2..5"), Ok(2..5));
        assert_eq!(parse_seed_range("7"), Ok(7..8));
        assert!(parse_seed_range("5..5").is_err());
        assert!(parse_seed_range("a..3").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "rescue-alloc",
            "solve",
            "--water",
            "baltic-sea",
            "--soft-penalty",
            "250",
            "--time-limit-secs",
            "3",
            "--zones",
            "8",
        ])
        .unwrap();
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        let cfg = run_config(&args.input).unwrap();
        assert_eq!(cfg.water, WaterSelection::BalticSea);
        assert_eq!(cfg.objective.policy.uncovered_penalty(), Some(250.0));
        assert_eq!(cfg.solver.time_limit_secs, Some(3.0));
        assert_eq!(args.zones, Some(8));
    }

    #[test]
    fn test_sweep_defaults() {
        let cli = Cli::try_parse_from(["rescue-alloc", "sweep", "--zone-counts", "10,20,30"]).unwrap();
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.seeds, 0..5);
        assert_eq!(args.zone_counts, vec![10, 20, 30]);
    }
}
