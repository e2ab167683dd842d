//! Sweep configuration: the parameter grid and how trials are run.
//!
//! A grid is a list of segments, each a cross product of sizes, thresholds
//! and replicate indices. Presets reproduce the standard experiment plans.
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::input::ValueRange;
use crate::sort::Threshold;
use crate::trial::{TrialParams, TrialSpec};

pub const DEFAULT_OUTPUT: &str = "results.csv";
pub const DEFAULT_SIZES: [usize; 5] = [1_000, 10_000, 100_000, 1_000_000, 10_000_000];
pub const DEFAULT_MAX_THRESHOLD: usize = 128;
pub const DEFAULT_TRIALS: usize = 5;

/// Thresholds of one grid segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThresholdAxis {
    /// The same thresholds for every size.
    Fixed(Vec<usize>),
    /// `n / 2^k` for every `k` with `2^k <= n`. Merge sort only halves, so
    /// thresholds between these points behave like the next one down.
    Halvings,
}

impl ThresholdAxis {
    fn values_for(&self, n: usize) -> Vec<usize> {
        match self {
            ThresholdAxis::Fixed(values) => values.clone(),
            ThresholdAxis::Halvings => (0..usize::BITS)
                .take_while(|&k| 1usize << k <= n)
                .map(|k| n >> k)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSegment {
    pub sizes: Vec<usize>,
    pub thresholds: ThresholdAxis,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    segments: Vec<GridSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Sizes 10^3..10^7, thresholds 1..=128.
    Full,
    /// Sizes 10^3..10^7 at a fixed threshold of 42.
    Sizes,
    /// Size 1000, thresholds 1..=1000.
    Thresholds,
    /// Sizes 10^3..10^5, thresholds halving from n.
    Halvings,
    /// `Sizes`, `Thresholds` and `Halvings` back to back.
    Classic,
}

impl Preset {
    fn segments(&self) -> Vec<GridSegment> {
        match self {
            Preset::Full => vec![GridSegment {
                sizes: DEFAULT_SIZES.to_vec(),
                thresholds: ThresholdAxis::Fixed((1..=DEFAULT_MAX_THRESHOLD).collect()),
                trials: DEFAULT_TRIALS,
            }],
            Preset::Sizes => vec![GridSegment {
                sizes: DEFAULT_SIZES.to_vec(),
                thresholds: ThresholdAxis::Fixed(vec![42]),
                trials: DEFAULT_TRIALS,
            }],
            Preset::Thresholds => vec![GridSegment {
                sizes: vec![1_000],
                thresholds: ThresholdAxis::Fixed((1..=1_000).collect()),
                trials: DEFAULT_TRIALS,
            }],
            Preset::Halvings => vec![GridSegment {
                sizes: vec![1_000, 10_000, 100_000],
                thresholds: ThresholdAxis::Halvings,
                trials: DEFAULT_TRIALS,
            }],
            Preset::Classic => [Preset::Sizes, Preset::Thresholds, Preset::Halvings]
                .iter()
                .flat_map(|p| p.segments())
                .collect(),
        }
    }
}

impl Grid {
    pub fn new(segments: Vec<GridSegment>) -> Self {
        Self { segments }
    }

    pub fn preset(preset: Preset) -> Self {
        Self::new(preset.segments())
    }

    /// A single cross product of `sizes x thresholds x 0..trials`.
    pub fn single(sizes: Vec<usize>, thresholds: Vec<usize>, trials: usize) -> Self {
        Self::new(vec![GridSegment {
            sizes,
            thresholds: ThresholdAxis::Fixed(thresholds),
            trials,
        }])
    }

    /// Override the replicate count of every segment.
    pub fn with_trials(mut self, trials: usize) -> Self {
        for segment in &mut self.segments {
            segment.trials = trials;
        }
        self
    }

    pub fn segments(&self) -> &[GridSegment] {
        &self.segments
    }

    /// Every trial of the grid in a fixed order: segment, then size, then
    /// threshold, then replicate. A triple that appears in more than one
    /// segment is kept at its first position only.
    pub fn enumerate(&self) -> Result<Vec<TrialParams>, ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptyAxis("segments"));
        }

        let mut seen = HashSet::new();
        let mut params = Vec::new();

        for segment in &self.segments {
            if segment.sizes.is_empty() {
                return Err(ConfigError::EmptyAxis("sizes"));
            }
            if segment.trials == 0 {
                return Err(ConfigError::EmptyAxis("trials"));
            }
            if segment.thresholds == ThresholdAxis::Fixed(vec![]) {
                return Err(ConfigError::EmptyAxis("thresholds"));
            }

            for &n in &segment.sizes {
                for s in segment.thresholds.values_for(n) {
                    let s = Threshold::new(s)?;
                    for t in 0..segment.trials {
                        let p = TrialParams::new(n, s, t);
                        if seen.insert(p) {
                            params.push(p);
                        }
                    }
                }
            }
        }

        Ok(params)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::preset(Preset::Full)
    }
}

/// Parse thresholds written as a comma-separated mix of values and ranges,
/// e.g. `1..=8,16,32` or `1..129`.
pub fn parse_thresholds(s: &str) -> Result<Vec<usize>, ConfigError> {
    let invalid = || ConfigError::InvalidList(s.to_string());
    let mut values = Vec::new();

    for part in s.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()) {
        if let Some((lo, hi)) = part.split_once("..=") {
            let lo: usize = lo.trim().parse().map_err(|_| invalid())?;
            let hi: usize = hi.trim().parse().map_err(|_| invalid())?;
            values.extend(lo..=hi);
        } else if let Some((lo, hi)) = part.split_once("..") {
            let lo: usize = lo.trim().parse().map_err(|_| invalid())?;
            let hi: usize = hi.trim().parse().map_err(|_| invalid())?;
            values.extend(lo..hi);
        } else {
            values.push(part.parse().map_err(|_| invalid())?);
        }
    }

    if values.is_empty() {
        return Err(invalid());
    }
    Ok(values)
}

/// Where each trial executes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkerMode {
    /// On the pool thread itself.
    #[default]
    Thread,
    /// In a child process running `program` in trial-worker mode.
    Process(PathBuf),
}

impl std::fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerMode::Thread => write!(f, "thread"),
            WorkerMode::Process(program) => write!(f, "process ({})", program.display()),
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Results file, appended to and resumed from
    pub output: PathBuf,
    pub grid: Grid,
    /// Size of the worker pool
    pub workers: usize,
    pub worker_mode: WorkerMode,
    pub trial: TrialSpec,
    /// Shuffle pending work with this seed before dispatch
    pub shuffle_seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            grid: Grid::default(),
            workers: default_workers(),
            worker_mode: WorkerMode::default(),
            trial: TrialSpec::default(),
            shuffle_seed: None,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.trial.value_range == ValueRange::UpTo(0) {
            return Err(ConfigError::EmptyValueRange);
        }
        Ok(())
    }
}

impl std::fmt::Display for SweepConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SweepConfig:")?;
        writeln!(f, "  Output: {}", self.output.display())?;
        writeln!(f, "  Grid segments: {}", self.grid.segments().len())?;
        for segment in self.grid.segments() {
            let thresholds = match &segment.thresholds {
                ThresholdAxis::Fixed(values) => summarize(values),
                ThresholdAxis::Halvings => "n / 2^k".to_string(),
            };
            writeln!(
                f,
                "    sizes={:?} thresholds={} trials={}",
                segment.sizes, thresholds, segment.trials
            )?;
        }
        writeln!(f, "  Workers: {} ({})", self.workers, self.worker_mode)?;
        writeln!(f, "  Seed policy: {}", self.trial.seed_policy)?;
        writeln!(f, "  Values: {}", self.trial.value_range)?;
        writeln!(f, "  Insertion counting: {}", self.trial.counting)?;
        write!(f, "  Verify: {}", self.trial.verify)
    }
}

fn summarize(values: &[usize]) -> String {
    match values {
        [] => "[]".to_string(),
        [first, .., last] if values.len() > 8 => {
            format!("[{}..={}] ({} values)", first, last, values.len())
        }
        _ => format!("{:?}", values),
    }
}
