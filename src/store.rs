//! Append-only CSV results file.
//!
//! Every row is keyed by `(n, s, t)`. Resuming a sweep replays the keys of
//! the existing rows into a completed set and only ever appends after that;
//! earlier rows are never rewritten.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{ConfigError, StoreError, SweepError};
use crate::sort::Threshold;
use crate::trial::{TrialParams, TrialResult};

/// Header of a freshly created results file.
pub const COLUMNS: [&str; 5] = ["n", "s", "t", "n_compares", "time_taken_s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLayout {
    /// Rows carry their replicate index.
    Current,
    /// No replicate column: rows of the same `(n, s)` are replicates
    /// `0, 1, ...` in file order.
    Legacy,
}

#[derive(Debug, Deserialize)]
struct StoredKey {
    n: usize,
    s: Threshold,
    #[serde(default)]
    t: Option<usize>,
}

/// A results file opened for resumption.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    /// Header of the existing file, `None` if there is no file yet.
    columns: Option<Vec<String>>,
    completed: HashSet<TrialParams>,
    /// Next replicate index per `(n, s)` of a legacy file.
    next_replicate: HashMap<(usize, Threshold), usize>,
}

impl ResultStore {
    /// Read the keys of every row already in `path`. A missing or empty
    /// file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let path = path.as_ref().to_path_buf();

        let is_empty = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                let source = std::io::Error::other("is a directory");
                return Err(StoreError::Open { path, source }.into());
            }
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(source) => return Err(StoreError::Open { path, source }.into()),
        };
        if is_empty {
            debug!("no existing results at {}", path.display());
            return Ok(Self {
                path,
                columns: None,
                completed: HashSet::new(),
                next_replicate: HashMap::new(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(&path)
            .map_err(|err| read_error(&path, err))?;

        let headers = reader
            .headers()
            .map_err(|err| read_error(&path, err))?
            .clone();
        for column in ["n", "s"] {
            if !headers.iter().any(|h| h == column) {
                return Err(ConfigError::MissingColumn { path, column }.into());
            }
        }

        // `t` wins over `trial` when a file has both
        let has_t = headers.iter().any(|h| h == "t");
        let has_trial_column = has_t || headers.iter().any(|h| h == "trial");
        let key_headers: StringRecord = headers
            .iter()
            .map(|h| match h {
                "trial" if !has_t => "t",
                "trial" => "",
                other => other,
            })
            .collect();

        let mut completed = HashSet::new();
        let mut next_replicate: HashMap<(usize, Threshold), usize> = HashMap::new();

        for result in reader.records() {
            let record = result.map_err(|err| read_error(&path, err))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let key: StoredKey = record
                .deserialize(Some(&key_headers))
                .map_err(|err| malformed(&path, line, err.to_string()))?;

            let t = match key.t {
                Some(t) => t,
                None if has_trial_column => {
                    return Err(malformed(&path, line, "missing trial index".to_string()));
                }
                None => {
                    let next = next_replicate.entry((key.n, key.s)).or_insert(0);
                    *next += 1;
                    *next - 1
                }
            };
            completed.insert(TrialParams::new(key.n, key.s, t));
        }

        if !has_trial_column {
            warn!(
                "{} has no trial column; numbering replicates by row order",
                path.display()
            );
        }
        info!(
            "replayed {} completed trials from {}",
            completed.len(),
            path.display()
        );

        Ok(Self {
            path,
            columns: Some(headers.iter().map(String::from).collect()),
            completed,
            next_replicate,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn completed(&self) -> &HashSet<TrialParams> {
        &self.completed
    }

    pub fn layout(&self) -> StoreLayout {
        match &self.columns {
            Some(columns) if !columns.iter().any(|c| c == "t" || c == "trial") => {
                StoreLayout::Legacy
            }
            _ => StoreLayout::Current,
        }
    }

    /// Open the file for appending. The header is written only when the
    /// file is new; rows for an existing file follow its header.
    pub fn writer(&self) -> Result<StoreWriter, StoreError> {
        let open_error = |source| StoreError::Open {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(open_error)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(open_error)?;

        // An existing last line without a terminator would swallow the
        // first appended row
        if self.columns.is_some() && !ends_with_newline(&mut file).map_err(open_error)? {
            file.write_all(b"\n").map_err(open_error)?;
        }

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        let columns = match &self.columns {
            Some(columns) => columns.clone(),
            None => {
                writer
                    .write_record(COLUMNS)
                    .map_err(|source| StoreError::Append {
                        path: self.path.clone(),
                        source,
                    })?;
                COLUMNS.iter().map(|c| c.to_string()).collect()
            }
        };

        let legacy = match self.layout() {
            StoreLayout::Legacy => Some(LegacyOrder {
                next: self.next_replicate.clone(),
                held: BTreeMap::new(),
            }),
            StoreLayout::Current => None,
        };

        let mut store_writer = StoreWriter {
            path: self.path.clone(),
            columns,
            writer,
            legacy,
        };
        store_writer.flush()?;
        Ok(store_writer)
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Row order of a legacy file is its replicate numbering, so rows of one
/// `(n, s)` are written strictly as `t = next, next + 1, ...`. A result
/// whose predecessor has not been written yet is held back.
#[derive(Debug)]
struct LegacyOrder {
    next: HashMap<(usize, Threshold), usize>,
    held: BTreeMap<TrialParams, TrialResult>,
}

impl LegacyOrder {
    /// Take `result` and return every row of its group that can now be
    /// written, in order.
    fn release(&mut self, result: TrialResult) -> Vec<TrialResult> {
        let (n, s) = (result.n, result.s);
        self.held.insert(result.params(), result);

        let next = self.next.entry((n, s)).or_insert(0);
        let mut ready = Vec::new();
        while let Some(row) = self.held.remove(&TrialParams::new(n, s, *next)) {
            ready.push(row);
            *next += 1;
        }
        ready
    }
}

/// Appends results one row at a time, flushing after each.
pub struct StoreWriter {
    path: PathBuf,
    columns: Vec<String>,
    writer: csv::Writer<File>,
    legacy: Option<LegacyOrder>,
}

impl StoreWriter {
    /// Append `result`. In a legacy file the row may be held back until
    /// the replicates before it have been appended.
    pub fn append(&mut self, result: &TrialResult) -> Result<(), StoreError> {
        let ready = match self.legacy.as_mut() {
            Some(order) => order.release(result.clone()),
            None => vec![result.clone()],
        };
        for row in &ready {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flush and sync the file to disk. Returns the results that were held
    /// back and never written because an earlier replicate is missing.
    pub fn finish(mut self) -> Result<Vec<TrialParams>, StoreError> {
        self.flush()?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|source| StoreError::Flush {
                path: self.path.clone(),
                source,
            })?;
        Ok(self
            .legacy
            .map(|order| order.held.into_keys().collect())
            .unwrap_or_default())
    }

    fn write_row(&mut self, result: &TrialResult) -> Result<(), StoreError> {
        let record: Vec<String> = self
            .columns
            .iter()
            .map(|column| column_value(column, result))
            .collect();
        self.writer
            .write_record(&record)
            .map_err(|source| StoreError::Append {
                path: self.path.clone(),
                source,
            })?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush().map_err(|source| StoreError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

fn column_value(column: &str, result: &TrialResult) -> String {
    match column {
        "n" => result.n.to_string(),
        "s" => result.s.to_string(),
        "t" | "trial" => result.t.to_string(),
        "n_compares" => result.n_compares.to_string(),
        "time_taken_s" => result.time_taken_s.to_string(),
        "time_taken_ms" => (result.time_taken_s * 1e3).to_string(),
        // Columns this crate does not produce, e.g. a dataframe index
        _ => String::new(),
    }
}

fn malformed(path: &Path, line: u64, reason: String) -> SweepError {
    ConfigError::MalformedStore {
        path: path.to_path_buf(),
        line,
        reason,
    }
    .into()
}

fn read_error(path: &Path, err: csv::Error) -> SweepError {
    if err.is_io_error() {
        StoreError::Read {
            path: path.to_path_buf(),
            source: err,
        }
        .into()
    } else {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        malformed(path, line, err.to_string())
    }
}
