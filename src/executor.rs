//! Where a trial runs.
//!
//! The driver hands [`TrialParams`] to a [`TrialExecutor`] from each pool
//! thread and gets back an owned result or a [`TrialError`]. Executors share
//! no mutable state with the driver or with each other.

use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::TrialError;
use crate::trial::{TrialParams, TrialResult, TrialSpec, run_trial};

/// Command-line flag that switches the binary into single-trial worker mode.
pub const TRIAL_WORKER_FLAG: &str = "--trial-worker";

pub trait TrialExecutor: Sync {
    fn execute(&self, params: TrialParams) -> Result<TrialResult, TrialError>;
}

/// Runs trials on the calling pool thread. A panic inside the trial is
/// caught and reported as a failed trial.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExecutor {
    spec: TrialSpec,
}

impl ThreadExecutor {
    pub fn new(spec: TrialSpec) -> Self {
        Self { spec }
    }
}

impl TrialExecutor for ThreadExecutor {
    fn execute(&self, params: TrialParams) -> Result<TrialResult, TrialError> {
        catch_trial(params, || run_trial(params, &self.spec))
    }
}

/// Run `f`, turning a panic into a [`TrialError`] for `params`.
pub fn catch_trial<F>(params: TrialParams, f: F) -> Result<TrialResult, TrialError>
where
    F: FnOnce() -> Result<TrialResult, TrialError>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(TrialError::new(params, panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

/// One line of JSON sent to a worker process on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRequest {
    pub params: TrialParams,
    pub spec: TrialSpec,
}

/// One line of JSON a worker process writes back on stdout.
pub type TrialReply = Result<TrialResult, String>;

/// Runs every trial in its own child process, so an abort in the trial
/// (allocation failure on a huge input, a signal) only loses that trial.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    spec: TrialSpec,
}

impl ProcessExecutor {
    /// `program` must accept [`TRIAL_WORKER_FLAG`] and serve one request
    /// with [`serve_trial_request`].
    pub fn new(program: impl Into<PathBuf>, spec: TrialSpec) -> Self {
        Self {
            program: program.into(),
            spec,
        }
    }
}

impl TrialExecutor for ProcessExecutor {
    fn execute(&self, params: TrialParams) -> Result<TrialResult, TrialError> {
        let fail = |reason: String| TrialError::new(params, reason);

        let request = serde_json::to_string(&TrialRequest {
            params,
            spec: self.spec,
        })
        .map_err(|e| fail(format!("cannot encode request: {}", e)))?;

        let mut child = Command::new(&self.program)
            .arg(TRIAL_WORKER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| fail(format!("cannot spawn {}: {}", self.program.display(), e)))?;
        debug!("worker pid {} running {}", child.id(), params);

        // Dropping stdin closes the pipe so the worker sees end of input
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = writeln!(stdin, "{}", request) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(fail(format!("cannot send request: {}", e)));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| fail(format!("cannot wait for worker: {}", e)))?;
        if !output.status.success() {
            return Err(fail(format!("worker exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply: TrialReply = serde_json::from_str(stdout.trim())
            .map_err(|e| fail(format!("unreadable worker reply: {}", e)))?;
        reply.map_err(fail)
    }
}

/// Worker side of [`ProcessExecutor`]: read one request line, run the
/// trial, write one reply line.
pub fn serve_trial_request<R: BufRead, W: Write>(mut input: R, mut output: W) -> std::io::Result<()> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let request: TrialRequest = serde_json::from_str(line.trim())?;

    let reply: TrialReply = run_trial(request.params, &request.spec).map_err(|e| e.reason);

    serde_json::to_writer(&mut output, &reply)?;
    writeln!(output)?;
    output.flush()
}
