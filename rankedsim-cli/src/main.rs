//! RankedSim CLI: simulate ladder climbs and inspect ladder tables.
//!
//! Commands:
//! - `simulate`: run Monte Carlo trials from a TOML config and/or flags
//! - `ladder`: print a ladder's rank table

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rankedsim_core::{LadderConfiguration, LadderPreset, Rank, SimulationParameters};
use rankedsim_runner::{
    probability_within, save_artifacts, Histogram, ResultSample, RunConfig, RunManifest,
    RunReport, DEFAULT_TARGET_BINS,
};

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 50;

#[derive(Parser)]
#[command(
    name = "rankedsim",
    about = "RankedSim CLI: Monte Carlo battles-to-rank simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate many independent ladder climbs and summarize battle counts.
    Simulate(SimulateArgs),
    /// Print the rank table of a ladder.
    Ladder {
        /// Built-in ladder: regular, sprint.
        #[arg(long)]
        ladder: Option<LadderPreset>,

        /// Custom ladder TOML file.
        #[arg(long)]
        ladder_file: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Path to a TOML run config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probability of winning a battle.
    #[arg(long)]
    win_rate: Option<f64>,

    /// Probability that a loss keeps its star (first place on the losing team).
    #[arg(long)]
    first_rate: Option<f64>,

    /// Built-in ladder: regular, sprint.
    #[arg(long)]
    ladder: Option<LadderPreset>,

    /// Custom ladder TOML file.
    #[arg(long)]
    ladder_file: Option<PathBuf>,

    /// Battles allowed per trial before it is abandoned.
    #[arg(long)]
    max_battles: Option<u32>,

    /// Number of trials.
    #[arg(long)]
    trials: Option<usize>,

    /// Rank to start from. Defaults to the worst rank of the ladder.
    #[arg(long)]
    start_rank: Option<Rank>,

    /// Rank to reach. Defaults to the best rank of the ladder.
    #[arg(long)]
    end_rank: Option<Rank>,

    /// Master seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (0 = all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Write summary.json, histogram.csv, sample.csv and report.md here.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Histogram bin width in battles. 0 picks a width automatically.
    #[arg(long, default_value_t = 1)]
    bin_width: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::Ladder {
            ladder,
            ladder_file,
        } => run_ladder(ladder, ladder_file),
    }
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = build_config(&args)?;
    let params = config.build_parameters()?;
    let runner = config.trial_runner();

    log::info!(
        "simulating {} trials on ladder '{}' ({} -> {}), win rate {}, first-place rate {:.4}",
        config.simulation.trials,
        params.ladder().name(),
        params.start_rank(),
        params.end_rank(),
        params.win_rate(),
        params.first_place_rate()
    );

    let sample = runner.run_many(&params, config.simulation.trials)?;

    let bin_width = if args.bin_width == 0 {
        Histogram::auto_bin_width(&sample, DEFAULT_TARGET_BINS)
    } else {
        args.bin_width
    };
    let manifest = RunManifest::new(
        &params,
        sample.len(),
        runner.seed(),
        config
            .config_hash()
            .context("failed to hash run config")?,
    );
    let report = RunReport::new(manifest, &sample, bin_width);

    print_summary(&report, &params, &sample);
    print_histogram(&report.histogram);

    if let Some(output_dir) = &args.output_dir {
        let run_dir = save_artifacts(&report, &sample, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

/// Load the config file (or defaults) and apply command-line overrides.
fn build_config(args: &SimulateArgs) -> Result<RunConfig> {
    if args.ladder.is_some() && args.ladder_file.is_some() {
        bail!("--ladder and --ladder-file are mutually exclusive");
    }

    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    let sim = &mut config.simulation;
    if let Some(v) = args.win_rate {
        sim.win_rate = v;
    }
    if let Some(v) = args.first_rate {
        sim.first_place_rate = v;
    }
    if let Some(v) = args.max_battles {
        sim.max_battles = v;
    }
    if let Some(v) = args.trials {
        sim.trials = v;
    }
    if let Some(v) = args.seed {
        sim.seed = v;
    }
    if let Some(v) = args.threads {
        sim.threads = v;
    }

    let ladder = &mut config.ladder;
    if let Some(preset) = args.ladder {
        ladder.preset = Some(preset);
        ladder.file = None;
    }
    if let Some(path) = &args.ladder_file {
        ladder.file = Some(path.clone());
        ladder.preset = None;
    }
    if args.start_rank.is_some() {
        ladder.start_rank = args.start_rank;
    }
    if args.end_rank.is_some() {
        ladder.end_rank = args.end_rank;
    }

    Ok(config)
}

fn print_summary(report: &RunReport, params: &SimulationParameters, sample: &ResultSample) {
    let s = &report.summary;
    println!();
    println!("=== Ranked Ladder Simulation ===");
    println!(
        "Ladder:       {} (rank {} to {})",
        params.ladder().name(),
        params.start_rank(),
        params.end_rank()
    );
    println!("Win rate:     {:.2}%", params.win_rate() * 100.0);
    println!("First rate:   {:.2}%", params.first_place_rate() * 100.0);
    println!("Trials:       {}", s.trials);
    println!("Seed:         {}", report.manifest.seed);
    println!("Fastest path: {} battles", params.minimum_battles());
    println!();

    match &s.stats {
        Some(st) => {
            println!("Mean:         {:.1} battles (std dev {:.1})", st.mean, st.std_dev);
            println!("Median:       {:.1}", st.median);
            println!("P10 / P90:    {:.1} / {:.1}", st.p10, st.p90);
            println!("Min / Max:    {} / {}", st.min, st.max);
            let median_budget = st.median.ceil() as u32;
            println!(
                "P(<= {median_budget}):    {:.1}%",
                probability_within(sample, median_budget) * 100.0
            );
        }
        None => println!("No trial reached rank {}.", params.end_rank()),
    }
    if s.abandoned > 0 {
        println!(
            "Abandoned:    {} ({:.2}%) exceeded {} battles",
            s.abandoned, s.abandoned_pct, s.max_battles
        );
    }
    println!();
}

fn print_histogram(histogram: &Histogram) {
    let peak = histogram
        .bins
        .iter()
        .map(|b| b.count)
        .chain(std::iter::once(histogram.abandoned))
        .max()
        .unwrap_or(0)
        .max(1);

    let label_width = histogram
        .bins
        .last()
        .map(|b| bar_label(b.lower, b.upper).len())
        .unwrap_or(0)
        .max("abandoned".len());

    println!("Battles (bin width {})", histogram.bin_width);
    for bin in &histogram.bins {
        println!(
            "{:>label_width$} | {:<BAR_WIDTH$} {:>6.2}%",
            bar_label(bin.lower, bin.upper),
            bar(bin.count, peak),
            bin.percent
        );
    }
    if histogram.abandoned > 0 {
        println!(
            "{:>label_width$} | {:<BAR_WIDTH$} {:>6.2}%",
            "abandoned",
            bar(histogram.abandoned, peak),
            histogram.abandoned_pct
        );
    }
}

fn bar_label(lower: u32, upper: u32) -> String {
    if lower == upper {
        lower.to_string()
    } else {
        format!("{lower}-{upper}")
    }
}

fn bar(count: usize, peak: usize) -> String {
    let len = (count * BAR_WIDTH).div_ceil(peak);
    "#".repeat(len.min(BAR_WIDTH))
}

fn run_ladder(preset: Option<LadderPreset>, file: Option<PathBuf>) -> Result<()> {
    let ladder = match (preset, file) {
        (Some(_), Some(_)) => bail!("--ladder and --ladder-file are mutually exclusive"),
        (_, Some(path)) => LadderConfiguration::from_file(&path)?,
        (preset, None) => preset.unwrap_or(LadderPreset::Regular).ladder()?,
    };

    println!(
        "Ladder '{}': {} ranks, {} to {}",
        ladder.name(),
        ladder.len(),
        ladder.start_rank(),
        ladder.end_rank()
    );
    println!();
    println!("{:>4} {:>6} {:>12} {:>10}", "Rank", "Stars", "Irrevocable", "Free star");
    println!("{}", "-".repeat(35));
    for def in ladder.ranks() {
        println!(
            "{:>4} {:>6} {:>12} {:>10}",
            def.rank,
            def.stars_required,
            if def.irrevocable { "yes" } else { "" },
            if def.grants_free_star { "yes" } else { "" }
        );
    }
    println!();
    println!(
        "Fastest climb: {} battles",
        ladder.minimum_battles(ladder.start_rank(), ladder.end_rank())
    );

    Ok(())
}
