//! Cold-start CSV log
//!
//! `runtime,replicate,cold_start_ms`, one row per trial, with `FAIL` in
//! place of the time for failed trials. Rows are appended as soon as a
//! trial finishes, so an interrupted run can be resumed.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::prober::SampleSink;
use crate::error::OutputError;
use crate::model::{ColdStartOutcome, ColdStartSample};

pub const HEADER: &str = "runtime,replicate,cold_start_ms";
const FAIL_MARKER: &str = "FAIL";

/// Append-only writer for the cold-start CSV
pub struct ColdStartLog {
    path: PathBuf,
    file: File,
}

impl ColdStartLog {
    /// Start a fresh log, replacing any existing file
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        Self::open_with(path, false)
    }

    /// Append to an existing log, creating it if needed
    pub fn append_to(path: &Path) -> Result<Self, OutputError> {
        Self::open_with(path, true)
    }

    fn open_with(path: &Path, append: bool) -> Result<Self, OutputError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options.open(path).map_err(|e| OutputError::io(path, e))?;

        let len = file.metadata().map_err(|e| OutputError::io(path, e))?.len();
        if len == 0 {
            writeln!(file, "{}", HEADER).map_err(|e| OutputError::io(path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, sample: &ColdStartSample) -> Result<(), OutputError> {
        writeln!(self.file, "{}", format_row(sample))
            .and_then(|_| self.file.flush())
            .map_err(|e| OutputError::io(&self.path, e))
    }
}

impl SampleSink for ColdStartLog {
    fn record(&mut self, sample: &ColdStartSample) -> Result<(), OutputError> {
        self.append(sample)
    }
}

pub fn format_row(sample: &ColdStartSample) -> String {
    match sample.outcome {
        ColdStartOutcome::Ready { elapsed_ms } => {
            format!("{},{},{:.2}", sample.runtime, sample.replicate_id, elapsed_ms)
        }
        ColdStartOutcome::Failure => {
            format!("{},{},{}", sample.runtime, sample.replicate_id, FAIL_MARKER)
        }
    }
}

fn parse_row(line: &str) -> Option<ColdStartSample> {
    let mut fields = line.split(',').map(str::trim);
    let runtime = fields.next().filter(|s| !s.is_empty())?;
    let replicate_id = fields.next()?.parse().ok()?;
    let value = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    if value == FAIL_MARKER {
        return Some(ColdStartSample::failure(runtime, replicate_id));
    }
    let elapsed_ms: f64 = value.parse().ok()?;
    (elapsed_ms.is_finite() && elapsed_ms >= 0.0)
        .then(|| ColdStartSample::ready(runtime, replicate_id, elapsed_ms))
}

/// Samples read back from a log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColdStartLogRead {
    pub samples: Vec<ColdStartSample>,
    pub malformed: usize,
}

/// Read a cold-start log, skipping and counting malformed rows
pub fn read_samples(path: &Path) -> Result<ColdStartLogRead, OutputError> {
    let content = fs::read(path).map_err(|e| OutputError::io(path, e))?;

    let mut read = ColdStartLogRead::default();
    for (index, raw) in content.split(|byte| *byte == b'\n').enumerate() {
        let line = std::str::from_utf8(raw).map(str::trim);
        if matches!(line, Ok("") | Ok(HEADER)) {
            continue;
        }
        match line.ok().and_then(parse_row) {
            Some(sample) => read.samples.push(sample),
            None => {
                debug!(line = index + 1, "Skipping malformed cold-start row");
                read.malformed += 1;
            }
        }
    }
    if read.malformed > 0 {
        warn!(path = %path.display(), malformed = read.malformed, "Cold-start log has malformed rows");
    }
    Ok(read)
}

/// `(runtime, replicate)` pairs that already have a sample
pub fn completed_pairs(samples: &[ColdStartSample]) -> HashSet<(String, u32)> {
    samples
        .iter()
        .map(|s| (s.runtime.clone(), s.replicate_id))
        .collect()
}
