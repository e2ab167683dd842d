#![allow(dead_code)]

use hybrid_sweep::{
    Grid, SweepConfig, ThreadExecutor, TrialError, TrialExecutor, TrialParams, TrialResult,
    TrialSpec, WorkerMode,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn small_config(
    output: PathBuf,
    sizes: Vec<usize>,
    thresholds: Vec<usize>,
    trials: usize,
) -> SweepConfig {
    SweepConfig {
        output,
        grid: Grid::single(sizes, thresholds, trials),
        workers: 3,
        worker_mode: WorkerMode::Thread,
        trial: TrialSpec {
            verify: true,
            ..TrialSpec::default()
        },
        shuffle_seed: None,
    }
}

/// Data rows of a results file, header excluded.
pub fn data_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open results");
    reader
        .records()
        .map(|r| r.expect("Bad record").iter().map(String::from).collect())
        .collect()
}

pub fn key(n: usize, s: usize, t: usize) -> TrialParams {
    TrialParams::new(n, hybrid_sweep::Threshold::new(s).unwrap(), t)
}

/// Thread executor that remembers what it ran and fails chosen trials.
#[derive(Default)]
pub struct RecordingExecutor {
    inner: ThreadExecutor,
    failing: HashSet<TrialParams>,
    pub executed: Mutex<Vec<TrialParams>>,
}

impl RecordingExecutor {
    pub fn failing(failing: impl IntoIterator<Item = TrialParams>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<TrialParams> {
        let mut executed = self.executed.lock().unwrap().clone();
        executed.sort();
        executed
    }
}

impl TrialExecutor for RecordingExecutor {
    fn execute(&self, params: TrialParams) -> Result<TrialResult, TrialError> {
        self.executed.lock().unwrap().push(params);
        if self.failing.contains(&params) {
            return Err(TrialError::new(params, "injected failure"));
        }
        self.inner.execute(params)
    }
}
