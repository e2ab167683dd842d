use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::TrialError;
use crate::input::{SeedPolicy, ValueRange, generate_input};
use crate::sort::{HybridSorter, InsertionCounting, Threshold};

/// One unit of sweep work: input size `n`, switch threshold `s`, replicate
/// index `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialParams {
    pub n: usize,
    pub s: Threshold,
    pub t: usize,
}

impl TrialParams {
    pub fn new(n: usize, s: Threshold, t: usize) -> Self {
        Self { n, s, t }
    }
}

impl std::fmt::Display for TrialParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(n={}, s={}, t={})", self.n, self.s, self.t)
    }
}

/// Measurement of one trial. Field order matches the results file columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub n: usize,
    pub s: Threshold,
    pub t: usize,
    pub n_compares: u64,
    pub time_taken_s: f64,
}

impl TrialResult {
    pub fn params(&self) -> TrialParams {
        TrialParams::new(self.n, self.s, self.t)
    }
}

/// Everything besides `(n, s, t)` that shapes a trial. Fixed for a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub seed_policy: SeedPolicy,
    pub value_range: ValueRange,
    pub counting: InsertionCounting,
    /// Fail the trial if the sorted output is out of order.
    pub verify: bool,
}

/// Generate the input for `params`, sort it once and time the sort.
///
/// Only the sort call is inside the timed region; input generation and the
/// optional verification are not.
pub fn run_trial(params: TrialParams, spec: &TrialSpec) -> Result<TrialResult, TrialError> {
    let mut rng = spec.seed_policy.rng_for(&params);
    let items = generate_input(params.n, spec.value_range, &mut rng);
    let sorter = HybridSorter::new(params.s).with_counting(spec.counting);

    let start = Instant::now();
    let (sorted, n_compares) = sorter.sort(items);
    let elapsed = start.elapsed();

    if spec.verify && (sorted.len() != params.n || !sorted.is_sorted()) {
        return Err(TrialError::new(params, "sorted output failed verification"));
    }

    Ok(TrialResult {
        n: params.n,
        s: params.s,
        t: params.t,
        n_compares,
        time_taken_s: elapsed.as_secs_f64(),
    })
}
