use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::TrialError;
use crate::trial::{TrialParams, TrialResult};

/// Outcome of one sweep run. Built only by the driver thread.
#[derive(Clone, Debug)]
pub struct SweepReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    /// Trials in the whole grid
    pub total: usize,
    /// Trials found in the results file at start
    pub skipped: usize,
    pub succeeded: usize,
    pub failures: Vec<TrialError>,
    /// Results of a legacy file not written because an earlier replicate
    /// of the same `(n, s)` failed. The next run repeats them.
    pub held_back: Vec<TrialParams>,
    /// Fastest result of this run for each input size
    fastest: BTreeMap<usize, TrialResult>,
}

impl SweepReport {
    pub fn new(started_at: DateTime<Local>, total: usize, skipped: usize) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            elapsed: Duration::ZERO,
            total,
            skipped,
            succeeded: 0,
            failures: Vec::new(),
            held_back: Vec::new(),
            fastest: BTreeMap::new(),
        }
    }

    pub fn record_success(&mut self, result: TrialResult) {
        self.succeeded += 1;
        match self.fastest.get(&result.n) {
            Some(best) if best.time_taken_s <= result.time_taken_s => {}
            _ => {
                self.fastest.insert(result.n, result);
            }
        }
    }

    pub fn record_failure(&mut self, err: TrialError) {
        self.failures.push(err);
    }

    pub fn record_held_back(&mut self, held_back: Vec<TrialParams>) {
        self.held_back.extend(held_back);
    }

    pub fn finish(&mut self, finished_at: DateTime<Local>, elapsed: Duration) {
        self.finished_at = finished_at;
        self.elapsed = elapsed;
    }

    /// Trials dispatched in this run, successful or not
    pub fn executed(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.held_back.is_empty()
    }

    pub fn fastest_by_size(&self) -> impl Iterator<Item = &TrialResult> {
        self.fastest.values()
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "SweepReport:")?;
        writeln!(f, "  Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  Finished: {}", self.finished_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  Elapsed: {:.2} s", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Trials in sweep: {}", self.total)?;
        writeln!(f, "  Skipped (already done): {}", self.skipped)?;
        writeln!(f, "  Executed: {}", self.executed())?;
        writeln!(f, "  Succeeded: {}", self.succeeded)?;
        writeln!(f, "  Failed: {}", self.failed())?;
        for err in &self.failures {
            writeln!(f, "    {}: {}", err.params, err.reason)?;
        }

        if !self.held_back.is_empty() {
            writeln!(f, "  Held back (earlier replicate missing): {}", self.held_back.len())?;
            for params in &self.held_back {
                writeln!(f, "    {}", params)?;
            }
        }

        if !self.fastest.is_empty() {
            writeln!(f, "  Fastest threshold per size (this run):")?;
            for best in self.fastest.values() {
                writeln!(
                    f,
                    "    n={:<10} s={:<6} {:.6} s, {} compares",
                    best.n, best.s, best.time_taken_s, best.n_compares
                )?;
            }
        }

        Ok(())
    }
}
