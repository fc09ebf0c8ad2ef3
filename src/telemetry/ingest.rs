//! Replicate ingestion
//!
//! Turns each raw run directory into one [`ReplicateResult`]. The summary
//! document is preferred when present; otherwise the event stream is parsed
//! and the same numbers are derived from the samples.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::layout::RunId;
use super::parser::{SummaryDocument, SummaryMetrics, TelemetryParser, DEFAULT_LATENCY_METRIC};
use crate::config::TelemetryConfig;
use crate::error::{IngestError, TelemetryError};
use crate::model::{NormalizedSample, ReplicateResult, ReplicateSource};
use crate::stats::estimators::{percentile_nearest_rank, sorted};

/// Raw file names and the latency metric to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub summary_file: String,
    pub events_file: String,
    pub latency_metric: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            summary_file: "k6_summary.json".to_string(),
            events_file: "k6_metrics.json".to_string(),
            latency_metric: DEFAULT_LATENCY_METRIC.to_string(),
        }
    }
}

impl From<&TelemetryConfig> for IngestConfig {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            summary_file: config.summary_file.clone(),
            events_file: config.events_file.clone(),
            latency_metric: config.latency_metric.clone(),
        }
    }
}

/// Outcome of ingesting every run under a raw results root
#[derive(Debug, Default)]
pub struct IngestReport {
    pub results: Vec<ReplicateResult>,
    /// Runs with neither a summary nor an event stream
    pub missing: Vec<RunId>,
    /// Directory names that do not follow the run grammar
    pub skipped: Vec<String>,
    /// Runs whose event stream held no latency samples
    pub empty: Vec<RunId>,
    /// Runs whose telemetry could not be decoded
    pub failed: Vec<RunId>,
}

impl IngestReport {
    pub fn problem_count(&self) -> usize {
        self.missing.len() + self.skipped.len() + self.empty.len() + self.failed.len()
    }
}

/// Numbers derived from an event stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamMetrics {
    pub throughput_rps: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub error_rate: f64,
}

impl StreamMetrics {
    /// `None` when there are no samples
    ///
    /// Throughput is samples over the first-to-last timestamp span; a zero
    /// span counts as one second.
    pub fn from_samples(samples: &[NormalizedSample]) -> Option<Self> {
        let first = samples.iter().map(|s| s.timestamp).min()?;
        let last = samples.iter().map(|s| s.timestamp).max()?;

        let span_seconds = (last - first).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0;
        let span_seconds = if span_seconds > 0.0 { span_seconds } else { 1.0 };

        let durations = sorted(&samples.iter().map(|s| s.duration_ms).collect::<Vec<_>>());
        let failures = samples.iter().filter(|s| !s.is_success()).count();

        Some(Self {
            throughput_rps: samples.len() as f64 / span_seconds,
            p95_ms: percentile_nearest_rank(&durations, 95.0),
            p99_ms: percentile_nearest_rank(&durations, 99.0),
            error_rate: failures as f64 / samples.len() as f64,
        })
    }
}

/// Reads raw run directories into replicate results
#[derive(Debug, Clone, Default)]
pub struct MetricIngestor {
    config: IngestConfig,
    parser: TelemetryParser,
}

impl MetricIngestor {
    pub fn new(config: IngestConfig) -> Self {
        let parser = TelemetryParser::new(config.latency_metric.clone());
        Self { config, parser }
    }

    /// Ingest one run directory
    pub fn ingest_run(&self, run: &RunId, dir: &Path) -> Result<ReplicateResult, IngestError> {
        let summary_path = dir.join(&self.config.summary_file);
        if summary_path.is_file() {
            let metrics = self.read_summary(&summary_path)?;
            debug!(run = %run, path = %summary_path.display(), "Ingested summary document");
            return Ok(Self::result(
                run,
                metrics.throughput_rps,
                metrics.p95_ms,
                metrics.p99_ms,
                metrics.error_rate,
                ReplicateSource::Summary,
            ));
        }

        let events_path = dir.join(&self.config.events_file);
        if events_path.is_file() {
            let metrics = self.read_events(&events_path)?;
            debug!(run = %run, path = %events_path.display(), "Ingested event stream");
            return Ok(Self::result(
                run,
                metrics.throughput_rps,
                metrics.p95_ms,
                metrics.p99_ms,
                metrics.error_rate,
                ReplicateSource::EventStream,
            ));
        }

        warn!(run = %run, dir = %dir.display(), "Missing data, skipping run");
        Err(IngestError::MissingData {
            run: run.to_string(),
            dir: dir.to_path_buf(),
        })
    }

    /// Ingest every immediate subdirectory of `root`, in name order
    ///
    /// Only failing to list `root` is an error; per-run problems are
    /// collected in the report.
    pub fn ingest_dir(&self, root: &Path) -> Result<IngestReport, IngestError> {
        let root_error = |source| IngestError::RootUnreadable {
            dir: root.to_path_buf(),
            source,
        };

        let mut dirs: Vec<(String, PathBuf)> = fs::read_dir(root)
            .map_err(root_error)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .collect();
        dirs.sort();

        let mut report = IngestReport::default();
        for (name, path) in dirs {
            let run = match RunId::parse(&name) {
                Ok(run) => run,
                Err(e) => {
                    warn!(dir = %name, error = %e, "Skipping directory with invalid run name");
                    report.skipped.push(name);
                    continue;
                }
            };

            match self.ingest_run(&run, &path) {
                Ok(result) => report.results.push(result),
                Err(IngestError::MissingData { .. }) => report.missing.push(run),
                Err(IngestError::NoSamples { path }) => {
                    warn!(run = %run, path = %path.display(), "Event stream has no latency samples");
                    report.empty.push(run);
                }
                Err(e) => {
                    warn!(run = %run, error = %e, "Failed to ingest run");
                    report.failed.push(run);
                }
            }
        }

        info!(
            root = %root.display(),
            ingested = report.results.len(),
            problems = report.problem_count(),
            "Raw results ingested"
        );
        Ok(report)
    }

    fn read_summary(&self, path: &Path) -> Result<SummaryMetrics, IngestError> {
        let decode = || -> Result<SummaryMetrics, TelemetryError> {
            let content = fs::read_to_string(path)?;
            Ok(SummaryMetrics::from_document(&SummaryDocument::parse(&content)?))
        };
        decode().map_err(|source| IngestError::Telemetry {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_events(&self, path: &Path) -> Result<StreamMetrics, IngestError> {
        let telemetry_error = |source: TelemetryError| IngestError::Telemetry {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::open(path).map_err(|e| telemetry_error(e.into()))?;
        let parsed = self
            .parser
            .parse_stream(BufReader::new(file))
            .map_err(telemetry_error)?;

        StreamMetrics::from_samples(&parsed.samples).ok_or_else(|| IngestError::NoSamples {
            path: path.to_path_buf(),
        })
    }

    fn result(
        run: &RunId,
        throughput_rps: f64,
        p95_ms: f64,
        p99_ms: f64,
        error_rate: f64,
        source: ReplicateSource,
    ) -> ReplicateResult {
        ReplicateResult {
            runtime: run.runtime.clone(),
            workload: run.workload.clone(),
            telemetry_mode: run.telemetry_mode,
            replicate_id: run.replicate_id,
            throughput_rps,
            p95_ms,
            p99_ms,
            error_rate,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TelemetryMode;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample(offset_ms: i64, duration_ms: f64, status: &str) -> NormalizedSample {
        NormalizedSample {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
                + Duration::milliseconds(offset_ms),
            duration_ms,
            status: Some(status.to_string()),
            name: None,
        }
    }

    fn point_line(time: &str, value: f64, status: &str) -> String {
        format!(
            r#"{{"type":"Point","metric":"http_req_duration","data":{{"time":"{}","value":{},"tags":{{"status":"{}"}}}}}}"#,
            time, value, status
        )
    }

    #[test]
    fn test_stream_metrics_derivation() {
        let mut samples: Vec<NormalizedSample> =
            (0..99).map(|i| sample(i * 20, 10.0 + i as f64, "200")).collect();
        samples.push(sample(1980, 500.0, "500"));

        let metrics = StreamMetrics::from_samples(&samples).unwrap();

        assert!((metrics.throughput_rps - 100.0 / 1.98).abs() < 1e-9);
        assert_eq!(metrics.p99_ms, 108.0);
        assert_eq!(metrics.p95_ms, 104.0);
        assert!((metrics.error_rate - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_zero_span_counts_as_one_second() {
        let samples = vec![sample(0, 5.0, "200"), sample(0, 7.0, "200")];
        let metrics = StreamMetrics::from_samples(&samples).unwrap();
        assert_eq!(metrics.throughput_rps, 2.0);
        assert!(StreamMetrics::from_samples(&[]).is_none());
    }

    #[test]
    fn test_summary_preferred_over_events() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("node_w1_1_otelfalse");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("k6_summary.json"),
            r#"{"metrics":{"http_reqs":{"rate":250.0},"http_req_duration":{"p(95)":40.0,"p(99)":90.0},"http_req_failed":{"rate":0.0}}}"#,
        )
        .unwrap();
        fs::write(dir.join("k6_metrics.json"), point_line("2024-05-01T10:00:00Z", 1.0, "200")).unwrap();

        let run = RunId::parse("node_w1_1_otelfalse").unwrap();
        let result = MetricIngestor::default().ingest_run(&run, &dir).unwrap();

        assert_eq!(result.source, ReplicateSource::Summary);
        assert_eq!(result.throughput_rps, 250.0);
        assert_eq!(result.p99_ms, 90.0);
    }

    #[test]
    fn test_ingest_dir_collects_problems() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let events = root.join("bun_w2_2_oteltrue");
        fs::create_dir_all(&events).unwrap();
        let lines = [
            point_line("2024-05-01T10:00:00Z", 20.0, "200"),
            "garbage".to_string(),
            point_line("2024-05-01T10:00:02Z", 30.0, "503"),
        ];
        fs::write(events.join("k6_metrics.json"), lines.join("\n")).unwrap();

        fs::create_dir_all(root.join("deno_w1_1_otelfalse")).unwrap();
        fs::create_dir_all(root.join("not-a-run")).unwrap();

        let empty = root.join("node_w1_4_otelfalse");
        fs::create_dir_all(&empty).unwrap();
        fs::write(empty.join("k6_metrics.json"), "{\"type\":\"Metric\"}\n").unwrap();

        let report = MetricIngestor::default().ingest_dir(root).unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.runtime, "bun");
        assert_eq!(result.telemetry_mode, TelemetryMode::On);
        assert_eq!(result.source, ReplicateSource::EventStream);
        assert_eq!(result.throughput_rps, 1.0);
        assert_eq!(result.error_rate, 0.5);

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.skipped, vec!["not-a-run".to_string()]);
        assert_eq!(report.empty.len(), 1);
        assert_eq!(report.problem_count(), 3);
    }

    #[test]
    fn test_unreadable_root_is_fatal() {
        let err = MetricIngestor::default()
            .ingest_dir(Path::new("/nonexistent/raw/results"))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_direct_ingest_run_warns_on_missing_data() {
        let tmp = TempDir::new().unwrap();
        let run = RunId::parse("node_w1_rest_1_otelfalse").unwrap();
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            MetricIngestor::default().ingest_run(&run, tmp.path())
        });

        assert!(matches!(result, Err(IngestError::MissingData { .. })));
        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("WARN"), "log was {:?}", log);
        assert!(log.contains("Missing data"));
    }
}
