//! k6 telemetry decoding
//!
//! Two raw formats are understood:
//!
//! - the newline-delimited event stream (`k6 run --out json=...`), decoded
//!   line by line into [`NormalizedSample`]s
//! - the end-of-test summary document (`--summary-export`), from which
//!   throughput, tail latency and failure rate are read directly

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::TelemetryError;
use crate::model::NormalizedSample;

/// Metric carrying per-request latency in the event stream
pub const DEFAULT_LATENCY_METRIC: &str = "http_req_duration";

/// Why a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    InvalidUtf8,
    InvalidJson,
    MissingData,
    MissingValue,
    MissingTags,
    InvalidTime,
}

/// Classification of a single event-stream line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Sample(NormalizedSample),
    /// Valid record of another type or metric, or a blank line
    NotApplicable,
    Malformed(MalformedReason),
}

/// Folded result of parsing an event stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStreamParse {
    pub samples: Vec<NormalizedSample>,
    pub not_applicable: usize,
    pub malformed: usize,
}

#[derive(Debug, Deserialize)]
struct RawMetricRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    metric: Option<String>,
    /// Shape depends on the record type, so it is decoded after filtering
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawPointData {
    time: Option<String>,
    value: Option<f64>,
    tags: Option<RawTags>,
}

#[derive(Debug, Deserialize)]
struct RawTags {
    /// Usually a string, but numeric codes are written by some outputs
    status: Option<Value>,
    name: Option<String>,
}

fn status_text(status: Option<Value>) -> Option<String> {
    match status? {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Event-stream line decoder
#[derive(Debug, Clone)]
pub struct TelemetryParser {
    latency_metric: String,
}

impl Default for TelemetryParser {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_METRIC)
    }
}

impl TelemetryParser {
    pub fn new(latency_metric: impl Into<String>) -> Self {
        Self {
            latency_metric: latency_metric.into(),
        }
    }

    pub fn latency_metric(&self) -> &str {
        &self.latency_metric
    }

    /// Classify one line of the event stream
    pub fn parse_line(&self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::NotApplicable;
        }

        let record: RawMetricRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(_) => return LineOutcome::Malformed(MalformedReason::InvalidJson),
        };

        if record.record_type.as_deref() != Some("Point")
            || record.metric.as_deref() != Some(self.latency_metric.as_str())
        {
            return LineOutcome::NotApplicable;
        }

        let Some(data) = record
            .data
            .and_then(|data| serde_json::from_value::<RawPointData>(data).ok())
        else {
            return LineOutcome::Malformed(MalformedReason::MissingData);
        };
        let Some(duration_ms) = data.value else {
            return LineOutcome::Malformed(MalformedReason::MissingValue);
        };
        let Some(tags) = data.tags else {
            return LineOutcome::Malformed(MalformedReason::MissingTags);
        };
        let timestamp = match data.time.as_deref().map(DateTime::parse_from_rfc3339) {
            Some(Ok(t)) => t.with_timezone(&Utc),
            _ => return LineOutcome::Malformed(MalformedReason::InvalidTime),
        };

        LineOutcome::Sample(NormalizedSample {
            timestamp,
            duration_ms,
            status: status_text(tags.status),
            name: tags.name,
        })
    }

    /// Classify one raw line, rejecting bytes that are not UTF-8
    pub fn parse_bytes(&self, line: &[u8]) -> LineOutcome {
        match std::str::from_utf8(line) {
            Ok(text) => self.parse_line(text),
            Err(_) => LineOutcome::Malformed(MalformedReason::InvalidUtf8),
        }
    }

    /// Parse a whole event stream; only read failures are errors
    pub fn parse_stream<R: BufRead>(&self, reader: R) -> Result<EventStreamParse, TelemetryError> {
        let mut parsed = EventStreamParse::default();
        for (index, line) in reader.split(b'\n').enumerate() {
            match self.parse_bytes(&line?) {
                LineOutcome::Sample(sample) => parsed.samples.push(sample),
                LineOutcome::NotApplicable => parsed.not_applicable += 1,
                LineOutcome::Malformed(reason) => {
                    debug!(line = index + 1, ?reason, "Dropping malformed telemetry line");
                    parsed.malformed += 1;
                }
            }
        }
        if parsed.malformed > 0 {
            warn!(
                malformed = parsed.malformed,
                accepted = parsed.samples.len(),
                "Event stream contained malformed lines"
            );
        }
        Ok(parsed)
    }
}

/// A decoded k6 summary document
#[derive(Debug, Clone)]
pub struct SummaryDocument {
    metrics: serde_json::Map<String, Value>,
}

impl SummaryDocument {
    pub fn parse(content: &str) -> Result<Self, TelemetryError> {
        let value: Value = serde_json::from_str(content)?;
        match value {
            Value::Object(mut root) => match root.remove("metrics") {
                Some(Value::Object(metrics)) => Ok(Self { metrics }),
                _ => Err(TelemetryError::MissingMetrics),
            },
            _ => Err(TelemetryError::MissingMetrics),
        }
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.contains_key(metric)
    }

    /// Numeric field of a metric, looked up directly or under `values`
    ///
    /// Absent metrics and fields read as `0.0`.
    pub fn metric_value(&self, metric: &str, field: &str) -> f64 {
        let Some(entry) = self.metrics.get(metric) else {
            return 0.0;
        };
        entry
            .get(field)
            .or_else(|| entry.get("values").and_then(|values| values.get(field)))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Headline numbers taken from a summary document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryMetrics {
    pub throughput_rps: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub error_rate: f64,
}

impl SummaryMetrics {
    /// HTTP request rate, falling back to WebSocket messages sent
    pub fn from_document(doc: &SummaryDocument) -> Self {
        let throughput_rps = if doc.has_metric("http_reqs") {
            doc.metric_value("http_reqs", "rate")
        } else {
            doc.metric_value("ws_msgs_sent", "rate")
        };
        Self {
            throughput_rps,
            p95_ms: doc.metric_value("http_req_duration", "p(95)"),
            p99_ms: doc.metric_value("http_req_duration", "p(99)"),
            error_rate: doc.metric_value("http_req_failed", "rate"),
        }
    }

    /// `throughput,p99,failure_rate`
    pub fn to_csv_line(&self) -> String {
        format!("{},{},{}", self.throughput_rps, self.p99_ms, self.error_rate)
    }
}

/// Read a summary file and extract its headline numbers
pub fn parse_summary_file(path: &Path) -> Result<SummaryMetrics, TelemetryError> {
    let content = std::fs::read_to_string(path)?;
    let doc = SummaryDocument::parse(&content)?;
    Ok(SummaryMetrics::from_document(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const POINT: &str = r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2024-05-01T10:00:00.000Z","value":12.5,"tags":{"status":"200","name":"GET /"}}}"#;

    #[test]
    fn test_accepts_latency_point() {
        let outcome = TelemetryParser::default().parse_line(POINT);
        let LineOutcome::Sample(sample) = outcome else {
            panic!("expected sample, got {:?}", outcome);
        };
        assert_eq!(sample.duration_ms, 12.5);
        assert_eq!(sample.status.as_deref(), Some("200"));
        assert_eq!(sample.name.as_deref(), Some("GET /"));
    }

    #[test]
    fn test_other_records_are_not_applicable() {
        let parser = TelemetryParser::default();
        let metric_def = r#"{"type":"Metric","metric":"http_req_duration","data":{}}"#;
        let other_metric = r#"{"type":"Point","metric":"vus","data":{"time":"2024-05-01T10:00:00Z","value":10,"tags":{}}}"#;

        assert_eq!(parser.parse_line(metric_def), LineOutcome::NotApplicable);
        assert_eq!(parser.parse_line(other_metric), LineOutcome::NotApplicable);
        assert_eq!(parser.parse_line("   "), LineOutcome::NotApplicable);
    }

    #[test]
    fn test_malformed_lines_classified() {
        let parser = TelemetryParser::default();
        assert_eq!(
            parser.parse_line("{not json"),
            LineOutcome::Malformed(MalformedReason::InvalidJson)
        );
        assert_eq!(
            parser.parse_line(r#"{"type":"Point","metric":"http_req_duration"}"#),
            LineOutcome::Malformed(MalformedReason::MissingData)
        );
        assert_eq!(
            parser.parse_line(
                r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2024-05-01T10:00:00Z","tags":{}}}"#
            ),
            LineOutcome::Malformed(MalformedReason::MissingValue)
        );
        assert_eq!(
            parser.parse_line(
                r#"{"type":"Point","metric":"http_req_duration","data":{"time":"yesterday","value":1,"tags":{}}}"#
            ),
            LineOutcome::Malformed(MalformedReason::InvalidTime)
        );
    }

    #[test]
    fn test_stream_accepts_exactly_matching_points() {
        let content = format!(
            "{}\n{{broken\n{}\n{}\n",
            POINT,
            r#"{"type":"Point","metric":"vus","data":{"time":"2024-05-01T10:00:00Z","value":1,"tags":{}}}"#,
            POINT
        );
        let parsed = TelemetryParser::default()
            .parse_stream(Cursor::new(content))
            .unwrap();

        assert_eq!(parsed.samples.len(), 2);
        assert_eq!(parsed.not_applicable, 1);
        assert_eq!(parsed.malformed, 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_counted_not_fatal() {
        let mut content = Vec::new();
        content.extend_from_slice(POINT.as_bytes());
        content.extend_from_slice(b"\n\xff\xfex\n");
        content.extend_from_slice(POINT.as_bytes());
        content.extend_from_slice(b"\r\n");

        let parsed = TelemetryParser::default()
            .parse_stream(Cursor::new(content))
            .unwrap();

        assert_eq!(parsed.samples.len(), 2);
        assert_eq!(parsed.malformed, 1);
        assert_eq!(
            TelemetryParser::default().parse_bytes(b"\xff"),
            LineOutcome::Malformed(MalformedReason::InvalidUtf8)
        );
    }

    #[test]
    fn test_numeric_status_tag_is_stringified() {
        let line = r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2024-05-01T10:00:00Z","value":3.0,"tags":{"status":503}}}"#;
        let LineOutcome::Sample(sample) = TelemetryParser::default().parse_line(line) else {
            panic!("numeric status should still yield a sample");
        };
        assert_eq!(sample.status.as_deref(), Some("503"));
        assert_eq!(sample.name, None);
    }

    #[test]
    fn test_summary_direct_and_nested_values() {
        let direct = SummaryDocument::parse(
            r#"{"metrics":{"http_reqs":{"rate":512.5},"http_req_duration":{"p(95)":80.0,"p(99)":120.0},"http_req_failed":{"rate":0.01}}}"#,
        )
        .unwrap();
        let nested = SummaryDocument::parse(
            r#"{"metrics":{"http_reqs":{"values":{"rate":512.5}},"http_req_duration":{"values":{"p(95)":80.0,"p(99)":120.0}},"http_req_failed":{"values":{"rate":0.01}}}}"#,
        )
        .unwrap();

        let a = SummaryMetrics::from_document(&direct);
        let b = SummaryMetrics::from_document(&nested);
        assert_eq!(a, b);
        assert_eq!(a.throughput_rps, 512.5);
        assert_eq!(a.p99_ms, 120.0);
        assert_eq!(a.to_csv_line(), "512.5,120,0.01");
    }

    #[test]
    fn test_summary_websocket_fallback_and_defaults() {
        let doc = SummaryDocument::parse(r#"{"metrics":{"ws_msgs_sent":{"rate":40.0}}}"#).unwrap();
        let metrics = SummaryMetrics::from_document(&doc);

        assert_eq!(metrics.throughput_rps, 40.0);
        assert_eq!(metrics.p99_ms, 0.0);
        assert_eq!(metrics.error_rate, 0.0);
    }

    #[test]
    fn test_summary_errors_are_distinct() {
        assert!(matches!(
            SummaryDocument::parse("not json"),
            Err(TelemetryError::InvalidSummary(_))
        ));
        assert!(matches!(
            SummaryDocument::parse(r#"{"state":{}}"#),
            Err(TelemetryError::MissingMetrics)
        ));
        assert!(matches!(
            parse_summary_file(Path::new("/nonexistent/k6_summary.json")),
            Err(TelemetryError::Io(_))
        ));
    }
}
