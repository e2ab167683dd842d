// Hybrid merge/insertion sort benchmark with a resumable parameter sweep

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod input;
pub mod report;
pub mod sort;
pub mod store;
pub mod trial;

// Export the main types
pub use config::{Grid, GridSegment, Preset, SweepConfig, ThresholdAxis, WorkerMode};
pub use driver::{SweepDriver, SweepPlan};
pub use error::{ConfigError, StoreError, SweepError, TrialError};
pub use executor::{
    ProcessExecutor, TRIAL_WORKER_FLAG, ThreadExecutor, TrialExecutor, serve_trial_request,
};
pub use input::{SeedPolicy, ValueRange};
pub use report::SweepReport;
pub use sort::{
    HybridSorter, InsertionCounting, Threshold, hybrid_sort, insertion_sort, insertion_sort_with,
    merge,
};
pub use store::{ResultStore, StoreLayout, StoreWriter};
pub use trial::{TrialParams, TrialResult, TrialSpec, run_trial};
