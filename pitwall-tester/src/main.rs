mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use pitwall_sim::RaceConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stderr, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::{load_race_config, split_csv};
use logic::{
    PitStrategy, ScenarioResult, StrategyAggregate, StrategyTester, aggregate_results,
    expand_strategies, resolve_seed_inputs,
};

#[derive(Debug, Parser)]
#[command(name = "pitwall-tester", version = "0.1.0")]
#[command(about = "Automated strategy sweeps and invariant checks for the Pitwall race simulator")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or a..b ranges).
    /// Defaults to the config file's seed, then 1337.
    #[arg(long)]
    seeds: Option<String>,

    /// Number of races per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Override the race distance from the config
    #[arg(long)]
    laps: Option<u32>,

    /// Race configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Print the per-lap render line of every race
    #[arg(long)]
    render: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    let strategies = expand_strategies(&split_csv(&args.strategies))?;
    let config = build_config(&args)?;
    let seeds = resolve_run_seeds(&args, &config)?;

    if wants_banner(&args) {
        announce_banner(&config, strategies.len(), seeds.len());
    }

    let start_time = Instant::now();
    let tester = StrategyTester::new(config, args.verbose).with_render(args.render);
    let results = run_strategies(&tester, &strategies, &seeds, args.iterations);
    let aggregates = aggregate_results(&results);

    write_reports(&args, &results, &aggregates, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in PitStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:22} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn build_config(args: &Args) -> Result<RaceConfig> {
    let mut config = load_race_config(args.config.as_deref())?;
    if let Some(laps) = args.laps {
        config = config.with_total_laps(laps);
        config.validate().context("invalid --laps override")?;
    }
    Ok(config)
}

/// Every race is reseeded, so `--seeds` takes precedence over a config seed.
fn resolve_run_seeds(args: &Args, config: &RaceConfig) -> Result<Vec<u64>> {
    match (&args.seeds, config.seed) {
        (Some(tokens), Some(config_seed)) => {
            eprintln!(
                "{}",
                format!("⚠️  Ignoring config seed {config_seed}; racing the --seeds list instead")
                    .yellow()
            );
            resolve_seed_inputs(&split_csv(tokens))
        }
        (Some(tokens), None) => resolve_seed_inputs(&split_csv(tokens)),
        (None, Some(config_seed)) => Ok(vec![config_seed]),
        (None, None) => resolve_seed_inputs(&[]),
    }
}

/// Machine-readable reports on stdout stay clean.
fn wants_banner(args: &Args) -> bool {
    args.report == "console" || args.output.is_some()
}

fn announce_banner(config: &RaceConfig, strategies: usize, seeds: usize) {
    println!("{}", "🏁 Pitwall Strategy Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
    println!(
        "{} laps | {strategies} strategies | {seeds} seeds",
        config.total_laps
    );
}

fn run_strategies(
    tester: &StrategyTester,
    strategies: &[PitStrategy],
    seeds: &[u64],
    iterations: usize,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for &strategy in strategies {
        results.extend(tester.run_strategy(strategy, seeds, iterations));
    }
    results
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    aggregates: &[StrategyAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    if args.render {
        if args.report == "console" {
            logic::reports::write_render_lines(&mut output_target, results)?;
        } else {
            logic::reports::write_render_lines(&mut stderr(), results)?;
        }
    }

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results, aggregates)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Pitwall Strategy Test Results\n\n_No strategies executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results, aggregates)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No strategies executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    aggregates,
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
