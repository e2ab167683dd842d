//! Resumable sweep driver.
//!
//! One run: replay the results file into a completed set, enumerate the
//! grid, drop what is already done, fan the rest out to a worker pool and
//! append every result as it arrives. The driver thread is the only writer
//! of the results file; workers hand results back by value over a channel.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Local;
use crossbeam::channel;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::config::{SweepConfig, WorkerMode};
use crate::error::{ConfigError, StoreError, SweepError, TrialError};
use crate::executor::{ProcessExecutor, ThreadExecutor, TrialExecutor};
use crate::report::SweepReport;
use crate::store::ResultStore;
use crate::trial::{TrialParams, TrialResult};

/// The grid after filtering against completed work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    /// Trials in the whole grid
    pub total: usize,
    /// Trials already in the results file
    pub skipped: usize,
    /// Trials to run, in dispatch order
    pub pending: Vec<TrialParams>,
}

pub struct SweepDriver {
    config: SweepConfig,
}

impl SweepDriver {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Enumerate the grid and remove every triple in `completed`.
    pub fn plan(&self, completed: &HashSet<TrialParams>) -> Result<SweepPlan, ConfigError> {
        let all = self.config.grid.enumerate()?;
        let total = all.len();

        let mut pending: Vec<TrialParams> = all
            .into_iter()
            .filter(|params| !completed.contains(params))
            .collect();
        let skipped = total - pending.len();

        if let Some(seed) = self.config.shuffle_seed {
            pending.shuffle(&mut SmallRng::seed_from_u64(seed));
        }

        Ok(SweepPlan {
            total,
            skipped,
            pending,
        })
    }

    /// Run the sweep with the executor selected by the configured worker
    /// mode.
    pub fn run(&self) -> Result<SweepReport, SweepError> {
        match &self.config.worker_mode {
            WorkerMode::Thread => self.run_with(&ThreadExecutor::new(self.config.trial)),
            WorkerMode::Process(program) => {
                self.run_with(&ProcessExecutor::new(program.clone(), self.config.trial))
            }
        }
    }

    /// Run the sweep, executing trials with `executor`.
    ///
    /// Configuration and store problems abort before anything is
    /// dispatched. A failing trial is recorded in the report and the sweep
    /// carries on; it is not written to the store, so the next run retries it.
    pub fn run_with<E: TrialExecutor>(&self, executor: &E) -> Result<SweepReport, SweepError> {
        self.config.validate()?;
        let started = Instant::now();
        let started_at = Local::now();

        let store = ResultStore::open(&self.config.output)?;
        let plan = self.plan(store.completed())?;

        println!("Trials in sweep: {}", plan.total);
        println!(
            "Skipped (already in {}): {}",
            store.path().display(),
            plan.skipped
        );
        println!("To run: {}", plan.pending.len());

        let mut report = SweepReport::new(started_at, plan.total, plan.skipped);
        if plan.pending.is_empty() {
            info!("nothing to run");
            report.finish(Local::now(), started.elapsed());
            return Ok(report);
        }

        let mut writer = store.writer()?;
        let to_run = plan.pending.len();
        let workers = self.config.workers.min(to_run);
        info!("dispatching {} trials to {} workers", to_run, workers);

        let (job_tx, job_rx) = channel::unbounded::<TrialParams>();
        for params in plan.pending {
            // Receiver is alive, cannot fail
            let _ = job_tx.send(params);
        }
        drop(job_tx);

        let (result_tx, result_rx) = channel::unbounded::<Result<TrialResult, TrialError>>();

        std::thread::scope(|s| -> Result<(), StoreError> {
            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move || {
                    for params in job_rx.iter() {
                        debug!("worker {} picked {}", worker_id, params);
                        if result_tx.send(executor.execute(params)).is_err() {
                            // Driver gave up
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            // Owned here so an early return disconnects the workers
            let result_rx = result_rx;
            for (done, outcome) in result_rx.iter().enumerate() {
                let done = done + 1;
                let pct = done as f64 * 100.0 / to_run as f64;
                match outcome {
                    Ok(result) => {
                        writer.append(&result)?;
                        println!(
                            "[{}/{}] {:5.1}% done {} compares={} time={:.6}s",
                            done,
                            to_run,
                            pct,
                            result.params(),
                            result.n_compares,
                            result.time_taken_s
                        );
                        report.record_success(result);
                    }
                    Err(err) => {
                        warn!("{}", err);
                        println!("[{}/{}] {:5.1}% FAILED {}", done, to_run, pct, err.params);
                        report.record_failure(err);
                    }
                }
            }
            Ok(())
        })?;

        let held_back = writer.finish()?;
        for params in &held_back {
            warn!("{} not written: an earlier replicate is missing", params);
        }
        report.record_held_back(held_back);
        report.finish(Local::now(), started.elapsed());
        Ok(report)
    }
}
