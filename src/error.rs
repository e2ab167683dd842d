use std::path::PathBuf;

use thiserror::Error;

use crate::trial::TrialParams;

/// Problems detected before any trial is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid switch threshold {0}: must be at least 1")]
    InvalidThreshold(usize),

    #[error("sweep grid has no {0}")]
    EmptyAxis(&'static str),

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("value range upper bound must be at least 1")]
    EmptyValueRange,

    #[error("cannot parse threshold list `{0}`")]
    InvalidList(String),

    #[error("store {path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("malformed store {path} at line {line}: {reason}")]
    MalformedStore {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

/// Failures touching the results file. Always fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read store {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("failed to append to store {path}: {source}")]
    Append { path: PathBuf, source: csv::Error },

    #[error("failed to flush store {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A single trial that did not produce a result. The sweep records it and
/// moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trial {params} failed: {reason}")]
pub struct TrialError {
    pub params: TrialParams,
    pub reason: String,
}

impl TrialError {
    pub fn new(params: TrialParams, reason: impl Into<String>) -> Self {
        Self {
            params,
            reason: reason.into(),
        }
    }
}

/// Fatal errors of a sweep run.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
