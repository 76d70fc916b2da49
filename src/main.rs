//! hglearn CLI - train Harmonic Grammar weights from Eval and targets files
//!
//! Three modes, mirroring how the data is usually analysed:
//!
//! 1. `hg`: one targets file, one run, full diagnostics
//! 2. `minus-one`: one targets file, retrained without each constraint
//! 3. `all`: every participant targets file in a directory
//!
//! Reports go to stdout (or `--output`); progress and logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use hglearn::rendering::{
    format_ablation, format_diagnostics, format_failures, format_participants, format_summary,
};
use hglearn::{
    Config, ConstraintId, Grammar, Participant, SweepOptions, TrainingOptions, WeightInit,
    ablation_study, diagnose, find_participant_files, load_active_constraints, load_dataset,
    load_grammar, run, run_participants,
};

/// Gradual Learning Algorithm for Harmonic Grammar
///
/// Learns constraint weights so that each input's observed outputs are the
/// highest-harmony candidates.
///
/// Examples:
///   hglearn hg --eval-dir evals --constraints AllConst --targets trg_ABC_1
///   hglearn minus-one --eval-dir evals --constraints AllConst --targets trg_ABC_1
///   hglearn all --eval-dir evals --constraints AllConst --targets-dir participants --parallel
#[derive(Parser, Debug)]
#[command(name = "hglearn")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./hglearn.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    ///
    /// Logs every accepted update and prints the effective configuration.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on one targets file
    Hg {
        #[command(flatten)]
        inputs: Inputs,
        /// Targets file (`.txt` appended if missing)
        #[arg(long, value_name = "FILE")]
        targets: PathBuf,
        #[command(flatten)]
        training: TrainArgs,
    },
    /// Retrain with each active constraint removed in turn
    MinusOne {
        #[command(flatten)]
        inputs: Inputs,
        /// Targets file (`.txt` appended if missing)
        #[arg(long, value_name = "FILE")]
        targets: PathBuf,
        #[command(flatten)]
        training: TrainArgs,
    },
    /// Train every participant's trg*.txt file in a directory
    All {
        #[command(flatten)]
        inputs: Inputs,
        /// Directory holding the participant targets files
        #[arg(long, value_name = "DIR")]
        targets_dir: PathBuf,
        #[command(flatten)]
        training: TrainArgs,
    },
}

#[derive(Args, Debug)]
struct Inputs {
    /// Directory holding the Eval-*.txt files
    #[arg(long, value_name = "DIR", default_value = ".")]
    eval_dir: PathBuf,

    /// Constraints file: `<id> <flag>` rows, flag 1 = active
    #[arg(long, value_name = "FILE", default_value = "AllConst")]
    constraints: PathBuf,
}

/// Training flags. Anything left unset falls back to the config file.
#[derive(Args, Debug)]
struct TrainArgs {
    /// Accepted-update budget
    #[arg(long)]
    iterations: Option<usize>,

    /// Learning rate
    #[arg(long)]
    rate: Option<f64>,

    /// Initial weights: uniform (all 1.0) or random ([0, 1))
    #[arg(long, value_name = "uniform|random")]
    weight_init: Option<WeightInit>,

    /// Random seed; runs with the same seed are identical
    #[arg(long)]
    seed: Option<u64>,

    /// Clamp weights at zero
    #[arg(long)]
    no_negative: bool,

    /// Harmony difference below which candidates tie
    #[arg(long)]
    tie_epsilon: Option<f64>,

    /// Run sweeps on all cores
    #[arg(long)]
    parallel: bool,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl TrainArgs {
    fn apply(&self, mut options: TrainingOptions) -> Result<TrainingOptions> {
        if let Some(v) = self.iterations {
            options.iterations = v;
        }
        if let Some(v) = self.rate {
            options.learning_rate = v;
        }
        if let Some(v) = self.weight_init {
            options.weight_init = v;
        }
        if self.seed.is_some() {
            options.seed = self.seed;
        }
        if self.no_negative {
            options.allow_negative_weights = false;
        }
        if let Some(v) = self.tie_epsilon {
            options.tie_epsilon = v;
        }
        options.validate()?;
        Ok(options)
    }

    fn sweep(&self, options: &TrainingOptions) -> SweepOptions {
        SweepOptions {
            parallel: self.parallel,
            base_seed: options.seed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(Path::new(".")).context("Failed to load hglearn.toml")?,
    };

    let (report, output) = match &cli.command {
        Command::Hg {
            inputs,
            targets,
            training,
        } => {
            let options = training.apply(config.training.clone())?;
            banner("HG LEARN", &config, &options, cli.verbose);
            (run_single(inputs, targets, &options)?, training.output.as_deref())
        }
        Command::MinusOne {
            inputs,
            targets,
            training,
        } => {
            let options = training.apply(config.training.clone())?;
            banner("HG MINUS ONE", &config, &options, cli.verbose);
            let sweep = training.sweep(&options);
            (
                run_minus_one(inputs, targets, &options, &sweep)?,
                training.output.as_deref(),
            )
        }
        Command::All {
            inputs,
            targets_dir,
            training,
        } => {
            let options = training.apply(config.training.clone())?;
            banner("HG ALL PARTICIPANTS", &config, &options, cli.verbose);
            let sweep = training.sweep(&options);
            (
                run_all(inputs, targets_dir, &options, &sweep)?,
                training.output.as_deref(),
            )
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            eprintln!("📝 Report written to {}", path.display());
        }
        None => print!("{}", report),
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn banner(title: &str, config: &Config, options: &TrainingOptions, verbose: bool) {
    eprintln!("{}", format!(" {} ", title).bold().on_magenta());
    if verbose {
        eprintln!("{}", config.display_summary());
    }
    eprintln!(
        "   Iterations: {}  Rate: {}  Init: {}",
        options.iterations, options.learning_rate, options.weight_init
    );
}

fn load_inputs(inputs: &Inputs) -> Result<(Vec<ConstraintId>, Grammar)> {
    let constraints = load_active_constraints(&inputs.constraints).with_context(|| {
        format!(
            "Failed to load constraints from {}",
            inputs.constraints.display()
        )
    })?;
    eprintln!("📋 Found {} active constraints", constraints.len());

    let grammar = load_grammar(&inputs.eval_dir, &constraints).with_context(|| {
        format!(
            "Failed to load Eval files from {}",
            inputs.eval_dir.display()
        )
    })?;
    eprintln!(
        "📂 Found {} inputs in {}",
        grammar.len(),
        inputs.eval_dir.display()
    );

    Ok((constraints, grammar))
}

fn run_single(inputs: &Inputs, targets: &Path, options: &TrainingOptions) -> Result<String> {
    let (constraints, grammar) = load_inputs(inputs)?;
    let data = load_dataset(targets)
        .with_context(|| format!("Failed to load targets {}", targets.display()))?;
    eprintln!("🎯 Found {} targets", data.total_targets());

    let result = run(&grammar, &data, &constraints, options)?;
    let diagnostics = diagnose(&grammar, &data, &constraints, &result)?;

    if result.is_perfect() {
        eprintln!("{}", "✓ All targets learned".green());
    } else {
        eprintln!(
            "{}",
            format!("⚠ Max accuracy {:.4}", result.max_accuracy).yellow()
        );
    }

    let mut report = format_summary(&result, &constraints);
    report.push('\n');
    report.push_str(&format_diagnostics(&diagnostics));
    report.push('\n');
    report.push_str(&format_failures(&diagnostics));
    Ok(report)
}

fn run_minus_one(
    inputs: &Inputs,
    targets: &Path,
    options: &TrainingOptions,
    sweep: &SweepOptions,
) -> Result<String> {
    let (constraints, grammar) = load_inputs(inputs)?;
    let data = load_dataset(targets)
        .with_context(|| format!("Failed to load targets {}", targets.display()))?;
    eprintln!(
        "🔬 Ablating {} constraints over {} targets",
        constraints.len(),
        data.total_targets()
    );

    let ablation = ablation_study(&grammar, &data, &constraints, options, sweep)?;

    let mut report = format_summary(&ablation.baseline, &constraints);
    report.push('\n');
    report.push_str(&format_ablation(&ablation));
    for entry in ablation.by_importance() {
        if entry.importance > 0.0 {
            report.push_str(&format!(
                "\nWithout constraint {} (importance {:.4}):\n",
                entry.removed, entry.importance
            ));
            report.push_str(&format_failures(&entry.diagnostics));
        }
    }
    Ok(report)
}

fn run_all(
    inputs: &Inputs,
    targets_dir: &Path,
    options: &TrainingOptions,
    sweep: &SweepOptions,
) -> Result<String> {
    let (constraints, grammar) = load_inputs(inputs)?;

    let files = find_participant_files(targets_dir).with_context(|| {
        format!(
            "Failed to list participant files in {}",
            targets_dir.display()
        )
    })?;
    if files.is_empty() {
        anyhow::bail!("No trg*.txt participant files in {}", targets_dir.display());
    }

    let participants = files
        .iter()
        .map(|f| {
            load_dataset(&f.path)
                .map(|data| Participant::new(f.code.clone(), data))
                .with_context(|| format!("Failed to load targets {}", f.path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    eprintln!("👥 Found {} participants", participants.len());

    let runs = run_participants(&grammar, &participants, &constraints, options, sweep)?;

    let mut report = format_participants(&runs);
    for r in &runs {
        report.push_str(&format!("\n== {} ==\n", r.code));
        report.push_str(&format_summary(&r.result, &constraints));
        report.push_str(&format_failures(&r.diagnostics));
    }
    Ok(report)
}
