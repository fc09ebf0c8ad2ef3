//! Raw k6 telemetry
//!
//! Decoding of event streams and summary documents, the run directory
//! naming grammar, and ingestion of a raw results tree into
//! [`ReplicateResult`](crate::model::ReplicateResult)s.

pub mod ingest;
pub mod layout;
pub mod parser;

pub use ingest::{IngestConfig, IngestReport, MetricIngestor, StreamMetrics};
pub use layout::RunId;
pub use parser::{
    parse_summary_file, EventStreamParse, LineOutcome, MalformedReason, SummaryDocument,
    SummaryMetrics, TelemetryParser,
};
