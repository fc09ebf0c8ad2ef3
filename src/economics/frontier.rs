//! Frontier CSV loading
//!
//! `timestamp,runtime,vus,otel,throughput_rps,p99_ms,failures`, one row per
//! measured load level. Columns are located by header name; rows that fail
//! to parse are skipped and counted.

use std::path::Path;
use tracing::{debug, warn};

use crate::error::OutputError;
use crate::model::{FrontierPoint, TelemetryMode};

const REQUIRED_COLUMNS: [&str; 6] = ["runtime", "vus", "otel", "throughput_rps", "p99_ms", "failures"];

/// Parsed frontier file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontierLoad {
    pub points: Vec<FrontierPoint>,
    /// Data rows that could not be parsed
    pub skipped: usize,
}

struct Columns {
    timestamp: Option<usize>,
    runtime: usize,
    vus: usize,
    otel: usize,
    throughput: usize,
    p99: usize,
    failures: usize,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|n| *n == name);
        Some(Self {
            timestamp: find("timestamp"),
            runtime: find(REQUIRED_COLUMNS[0])?,
            vus: find(REQUIRED_COLUMNS[1])?,
            otel: find(REQUIRED_COLUMNS[2])?,
            throughput: find(REQUIRED_COLUMNS[3])?,
            p99: find(REQUIRED_COLUMNS[4])?,
            failures: find(REQUIRED_COLUMNS[5])?,
        })
    }

    fn parse_row(&self, line: &str) -> Option<FrontierPoint> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let get = |idx: usize| fields.get(idx).copied();

        let runtime = get(self.runtime).filter(|s| !s.is_empty())?;
        Some(FrontierPoint {
            timestamp: self
                .timestamp
                .and_then(get)
                .unwrap_or_default()
                .to_string(),
            runtime: runtime.to_string(),
            telemetry_mode: get(self.otel)?.parse::<TelemetryMode>().ok()?,
            concurrency_level: get(self.vus)?.parse().ok()?,
            throughput_rps: get(self.throughput)?.parse().ok()?,
            p99_ms: get(self.p99)?.parse().ok()?,
            failures: get(self.failures)?.parse().ok()?,
        })
    }
}

/// Parse frontier CSV content
///
/// A missing or incomplete header yields an empty load with every data row
/// counted as skipped.
pub fn parse_frontier(content: &str) -> FrontierLoad {
    parse_frontier_bytes(content.as_bytes())
}

/// Parse raw frontier bytes; rows that are not UTF-8 are skipped
pub fn parse_frontier_bytes(content: &[u8]) -> FrontierLoad {
    let mut lines = content
        .split(|byte| *byte == b'\n')
        .map(|raw| std::str::from_utf8(raw).map(str::trim))
        .filter(|line| !matches!(line, Ok("")));
    let Some(header) = lines.next() else {
        return FrontierLoad::default();
    };

    let Some(columns) = header.ok().and_then(Columns::from_header) else {
        let skipped = lines.count();
        warn!(skipped, "Frontier CSV header is missing required columns");
        return FrontierLoad {
            points: Vec::new(),
            skipped,
        };
    };

    let mut load = FrontierLoad::default();
    for (index, line) in lines.enumerate() {
        match line.ok().and_then(|line| columns.parse_row(line)) {
            Some(point) => load.points.push(point),
            None => {
                debug!(row = index + 1, "Skipping malformed frontier row");
                load.skipped += 1;
            }
        }
    }
    if load.skipped > 0 {
        warn!(skipped = load.skipped, "Skipped malformed frontier rows");
    }
    load
}

/// Read and parse a frontier CSV file
pub fn load_frontier(path: &Path) -> Result<FrontierLoad, OutputError> {
    let content = std::fs::read(path).map_err(|e| OutputError::io(path, e))?;
    Ok(parse_frontier_bytes(&content))
}
