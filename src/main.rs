use clap::{Parser, ValueEnum};
use env_logger::Env;
use hybrid_sweep::config::{DEFAULT_MAX_THRESHOLD, DEFAULT_SIZES, DEFAULT_TRIALS, parse_thresholds};
use hybrid_sweep::input::DEFAULT_BASE_SEED;
use hybrid_sweep::{
    Grid, InsertionCounting, Preset, SeedPolicy, SweepConfig, SweepDriver, TrialSpec, ValueRange,
    WorkerMode, serve_trial_request,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hybrid-sweep")]
#[command(about = "Resumable threshold sweep for hybrid merge-insertion sort", long_about = None)]
struct Args {
    /// Results CSV, created if missing and resumed if present
    #[arg(default_value = "results.csv")]
    output: PathBuf,

    /// Grid preset, used unless sizes or thresholds are given
    #[arg(short, long, value_enum, default_value = "full")]
    preset: PresetArg,

    /// Comma-separated input sizes (e.g., 1000,10000)
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Thresholds as values and ranges (e.g., 1..=128 or 1..=8,16,32)
    #[arg(long)]
    thresholds: Option<String>,

    /// Replicate trials per (size, threshold)
    #[arg(short, long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Number of workers (default: available parallelism)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Run each trial in a child process or on a pool thread
    #[arg(long, value_enum, default_value = "process")]
    worker_mode: WorkerModeArg,

    /// How trial inputs are seeded
    #[arg(long, value_enum, default_value = "base-plus-trial")]
    seed_policy: SeedPolicyArg,

    /// Base seed for seeded policies
    #[arg(long, default_value_t = DEFAULT_BASE_SEED)]
    seed: u64,

    /// Insertion sort comparison counting policy
    #[arg(long, value_enum, default_value = "short-circuit")]
    counting: CountingArg,

    /// Upper bound of generated values (default: the input size)
    #[arg(long)]
    max_value: Option<u64>,

    /// Shuffle pending trials with this seed before dispatch
    #[arg(long)]
    shuffle_seed: Option<u64>,

    /// Check every sorted output
    #[arg(long)]
    verify: bool,

    /// Serve a single trial request on stdin (used by process workers)
    #[arg(long, hide = true)]
    trial_worker: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    /// Sizes 10^3..10^7, thresholds 1..=128
    Full,
    /// Sizes 10^3..10^7, threshold 42
    Sizes,
    /// Size 1000, thresholds 1..=1000
    Thresholds,
    /// Sizes 10^3..10^5, thresholds n / 2^k
    Halvings,
    /// sizes + thresholds + halvings
    Classic,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Full => Preset::Full,
            PresetArg::Sizes => Preset::Sizes,
            PresetArg::Thresholds => Preset::Thresholds,
            PresetArg::Halvings => Preset::Halvings,
            PresetArg::Classic => Preset::Classic,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum WorkerModeArg {
    Process,
    Thread,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SeedPolicyArg {
    /// seed = base + trial index
    BasePlusTrial,
    /// seed mixed from base, n, s and trial index
    PerTriple,
    /// OS randomness, not reproducible
    Entropy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CountingArg {
    ShortCircuit,
    Exhaustive,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.trial_worker {
        serve_trial_request(std::io::stdin().lock(), std::io::stdout().lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = build_config(&args)?;
    println!("{}", config);

    let report = SweepDriver::new(config).run()?;
    println!("\n{}", report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn build_config(args: &Args) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    let grid = match (&args.sizes, &args.thresholds) {
        (None, None) => Grid::preset(args.preset.into()).with_trials(args.trials),
        (sizes, thresholds) => {
            let sizes = sizes.clone().unwrap_or_else(|| DEFAULT_SIZES.to_vec());
            let thresholds = match thresholds {
                Some(list) => parse_thresholds(list)?,
                None => (1..=DEFAULT_MAX_THRESHOLD).collect(),
            };
            Grid::single(sizes, thresholds, args.trials)
        }
    };

    let worker_mode = match args.worker_mode {
        WorkerModeArg::Process => WorkerMode::Process(std::env::current_exe()?),
        WorkerModeArg::Thread => WorkerMode::Thread,
    };

    let seed_policy = match args.seed_policy {
        SeedPolicyArg::BasePlusTrial => SeedPolicy::BasePlusTrial { base: args.seed },
        SeedPolicyArg::PerTriple => SeedPolicy::PerTriple { base: args.seed },
        SeedPolicyArg::Entropy => SeedPolicy::Entropy,
    };

    let counting = match args.counting {
        CountingArg::ShortCircuit => InsertionCounting::ShortCircuit,
        CountingArg::Exhaustive => InsertionCounting::Exhaustive,
    };

    let mut config = SweepConfig {
        output: args.output.clone(),
        grid,
        worker_mode,
        trial: TrialSpec {
            seed_policy,
            value_range: args.max_value.map_or(ValueRange::UpToSize, ValueRange::UpTo),
            counting,
            verify: args.verify,
        },
        shuffle_seed: args.shuffle_seed,
        ..SweepConfig::default()
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    Ok(config)
}
