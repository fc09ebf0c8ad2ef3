//! File I/O for processed results

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::artifact::AnalysisArtifact;
use crate::error::OutputError;
use crate::stats::AggregateStat;

/// File name of the per-cell aggregate table
pub const AGGREGATES_CSV: &str = "summary_stats.csv";

const AGGREGATES_HEADER: &str = "runtime,workload,otel,n,throughput_mean,throughput_std,\
p99_mean,p99_std,p95_mean,error_rate_mean,slo_success_count,slo_throughput_mean,\
cost_per_success,throughput_ci_lower,throughput_ci_upper,p99_ci_lower,p99_ci_upper";

pub fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::io(dir, e))
}

/// Write an artifact as pretty JSON under `dir`
pub fn write_artifact(dir: &Path, artifact: &AnalysisArtifact) -> Result<PathBuf, OutputError> {
    ensure_dir(dir)?;

    let path = dir.join(artifact.file_name());
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json).map_err(|e| OutputError::io(&path, e))?;

    info!(kind = %artifact.kind, path = %path.display(), "Wrote analysis artifact");
    Ok(path)
}

pub fn read_artifact(path: &Path) -> Result<AnalysisArtifact, OutputError> {
    let content = fs::read_to_string(path).map_err(|e| OutputError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Read every artifact in `dir`, newest first
///
/// Files that fail to decode are skipped with a warning. A missing
/// directory yields no artifacts.
pub fn read_artifacts(dir: &Path) -> Result<Vec<AnalysisArtifact>, OutputError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| OutputError::io(dir, e))? {
        let path = entry.map_err(|e| OutputError::io(dir, e))?.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            match read_artifact(&path) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
            }
        }
    }

    artifacts.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    Ok(artifacts)
}

/// Render aggregates as CSV; infinite cost is written as `inf`
pub fn aggregates_csv(stats: &[AggregateStat]) -> String {
    let mut out = String::with_capacity(AGGREGATES_HEADER.len() + stats.len() * 128);
    out.push_str(AGGREGATES_HEADER);
    out.push('\n');
    for s in stats {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            s.runtime,
            s.workload,
            s.telemetry_mode,
            s.n,
            s.throughput_mean,
            s.throughput_std,
            s.p99_mean,
            s.p99_std,
            s.p95_mean,
            s.error_rate_mean,
            s.slo_success_count,
            s.slo_throughput_mean,
            s.cost_per_success,
            s.throughput_ci.lower,
            s.throughput_ci.upper,
            s.p99_ci.lower,
            s.p99_ci.upper,
        );
    }
    out
}

pub fn write_aggregates_csv(dir: &Path, stats: &[AggregateStat]) -> Result<PathBuf, OutputError> {
    ensure_dir(dir)?;

    let path = dir.join(AGGREGATES_CSV);
    fs::write(&path, aggregates_csv(stats)).map_err(|e| OutputError::io(&path, e))?;

    info!(rows = stats.len(), path = %path.display(), "Wrote aggregate table");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ArtifactKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_artifact() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("processed");

        let artifact = AnalysisArtifact::new(ArtifactKind::Aggregates, &json!([{"n": 3}])).unwrap();
        let path = write_artifact(&dir, &artifact).unwrap();

        assert!(path.starts_with(&dir));
        let back = read_artifact(&path).unwrap();
        assert_eq!(back.artifact_id, artifact.artifact_id);
        assert_eq!(back.get("0.n"), Some(&json!(3)));
    }

    #[test]
    fn test_read_artifacts_skips_bad_files() {
        let tmp = TempDir::new().unwrap();
        let artifact = AnalysisArtifact::new(ArtifactKind::Overhead, &json!([])).unwrap();
        write_artifact(tmp.path(), &artifact).unwrap();
        fs::write(tmp.path().join("broken.json"), "{").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let artifacts = read_artifacts(tmp.path()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(read_artifacts(&tmp.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_aggregates_csv_has_header_only() {
        let csv = aggregates_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("runtime,workload,otel,n,"));
        assert_eq!(csv.lines().next().unwrap().split(',').count(), 17);
    }
}
