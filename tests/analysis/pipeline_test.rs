//! Integration tests for the analysis pipeline
//!
//! Raw run directories on disk are ingested, aggregated, analysed for cost
//! per success and persisted, exercising the same path as `aggregate`.

use runtime_lens::economics::{
    parse_frontier, EconomicAnalyzer, MaxStableThroughput, OverheadComparator, SloPolicy,
};
use runtime_lens::results::{
    read_artifact, write_aggregates_csv, write_artifact, AnalysisArtifact, ArtifactKind,
};
use runtime_lens::stats::{AggregateStat, BootstrapConfig, StatisticalAggregator};
use runtime_lens::telemetry::{MetricIngestor, RunId};
use runtime_lens::{ReplicateSource, TelemetryMode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_summary(root: &Path, run: &str, rps: f64, p99: f64, failed: f64) {
    let dir = root.join(run);
    fs::create_dir_all(&dir).unwrap();
    let doc = format!(
        r#"{{"metrics":{{"http_reqs":{{"values":{{"rate":{rps}}}}},"http_req_duration":{{"values":{{"p(95)":{p95},"p(99)":{p99}}}}},"http_req_failed":{{"values":{{"rate":{failed}}}}}}}}}"#,
        rps = rps,
        p95 = p99 * 0.8,
        p99 = p99,
        failed = failed
    );
    fs::write(dir.join("k6_summary.json"), doc).unwrap();
}

fn write_events(root: &Path, run: &str, durations: &[f64]) {
    let dir = root.join(run);
    fs::create_dir_all(&dir).unwrap();
    let lines: Vec<String> = durations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                r#"{{"type":"Point","metric":"http_req_duration","data":{{"time":"2024-05-01T10:00:{:02}Z","value":{},"tags":{{"status":"200"}}}}}}"#,
                i, d
            )
        })
        .collect();
    fs::write(dir.join("k6_metrics.json"), lines.join("\n")).unwrap();
}

fn raw_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_summary(root, "node_w1_rest_1_otelfalse", 1000.0, 100.0, 0.0);
    write_summary(root, "node_w1_rest_2_otelfalse", 1200.0, 120.0, 0.0);
    write_summary(root, "node_w1_rest_3_otelfalse", 1100.0, 110.0, 0.0);
    write_summary(root, "node_w1_rest_1_oteltrue", 900.0, 250.0, 0.01);
    write_summary(root, "node_w1_rest_2_oteltrue", 950.0, 260.0, 0.02);
    write_events(root, "bun_w1_rest_1", &[10.0, 20.0, 30.0]);
    fs::create_dir_all(root.join("README")).unwrap();
    tmp
}

fn aggregate(root: &Path) -> Vec<AggregateStat> {
    let report = MetricIngestor::default().ingest_dir(root).unwrap();
    StatisticalAggregator::new(SloPolicy::default(), BootstrapConfig::default(), 7)
        .aggregate(&report.results)
}

#[test]
fn test_ingest_raw_tree() {
    let tmp = raw_tree();
    let report = MetricIngestor::default().ingest_dir(tmp.path()).unwrap();

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.skipped, vec!["README".to_string()]);

    let bun = report
        .results
        .iter()
        .find(|r| r.runtime == "bun")
        .unwrap();
    assert_eq!(bun.source, ReplicateSource::EventStream);
    assert_eq!(bun.telemetry_mode, TelemetryMode::Off);
    assert_eq!(bun.p99_ms, 30.0);
    assert_eq!(bun.throughput_rps, 1.5);
}

#[test]
fn test_aggregate_cells_and_cost() {
    let tmp = raw_tree();
    let stats = aggregate(tmp.path());

    assert_eq!(stats.len(), 3);
    let keys: Vec<String> = stats.iter().map(|s| s.key().to_string()).collect();
    let mut sorted_keys = keys.clone();
    sorted_keys.sort();
    assert_eq!(keys.len(), sorted_keys.len());

    let node_off = stats
        .iter()
        .find(|s| s.runtime == "node" && s.telemetry_mode == TelemetryMode::Off)
        .unwrap();
    assert_eq!(node_off.n, 3);
    assert_eq!(node_off.workload, "w1_rest");
    assert!((node_off.throughput_mean - 1100.0).abs() < 1e-9);
    assert_eq!(node_off.slo_success_count, 3);
    assert!((node_off.cost_per_success.value() - 1.0 / 1100.0).abs() < 1e-12);
    assert!(node_off.throughput_ci.contains(node_off.throughput_mean));

    let node_on = stats
        .iter()
        .find(|s| s.runtime == "node" && s.telemetry_mode == TelemetryMode::On)
        .unwrap();
    assert_eq!(node_on.slo_success_count, 0);
    assert!(node_on.cost_per_success.is_infinite());
}

#[test]
fn test_aggregate_is_reproducible() {
    let tmp = raw_tree();
    assert_eq!(aggregate(tmp.path()), aggregate(tmp.path()));
}

#[test]
fn test_economics_from_aggregates() {
    let tmp = raw_tree();
    let stats = aggregate(tmp.path());
    let economics = EconomicAnalyzer::default().analyze_aggregates(&stats);

    let node_on = economics
        .iter()
        .find(|e| e.runtime == "node" && e.telemetry_mode == TelemetryMode::On)
        .unwrap();
    assert_eq!(node_on.max_stable_throughput, MaxStableThroughput::SloViolation);

    let node_off = economics
        .iter()
        .find(|e| e.runtime == "node" && e.telemetry_mode == TelemetryMode::Off)
        .unwrap();
    assert!(!node_off.max_stable_throughput.is_slo_violation());
}

#[test]
fn test_persisted_outputs() {
    let tmp = raw_tree();
    let stats = aggregate(tmp.path());
    let out = tmp.path().join("processed");

    let csv_path = write_aggregates_csv(&out, &stats).unwrap();
    let csv = fs::read_to_string(csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains(",inf,"));

    let artifact = AnalysisArtifact::new(ArtifactKind::Aggregates, &stats).unwrap();
    let path = write_artifact(&out, &artifact).unwrap();
    let back: Vec<AggregateStat> = read_artifact(&path).unwrap().payload_as().unwrap();
    assert_eq!(back.len(), stats.len());
    for (read, written) in back.iter().zip(&stats) {
        assert_eq!(read.key(), written.key());
        assert_eq!(read.n, written.n);
        assert_eq!(read.slo_success_count, written.slo_success_count);
        assert_eq!(read.cost_per_success.is_infinite(), written.cost_per_success.is_infinite());
    }
}

#[test]
fn test_frontier_to_economics_and_overhead() {
    let csv = "timestamp,runtime,vus,otel,throughput_rps,p99_ms,failures\n\
        t0,node,10,false,150,100,0\n\
        t1,node,50,false,300,250,0\n\
        t2,node,10,true,140,130,0\n\
        t3,bun,10,false,400,90,0\n";
    let load = parse_frontier(csv);
    assert_eq!(load.points.len(), 4);

    let economics = EconomicAnalyzer::default().analyze_frontier(&load.points);
    let node_off = economics
        .iter()
        .find(|e| e.runtime == "node" && e.telemetry_mode == TelemetryMode::Off)
        .unwrap();
    assert_eq!(node_off.max_stable_throughput, MaxStableThroughput::Stable(150.0));

    let overhead = OverheadComparator::new().compare_frontier(&load.points);
    assert_eq!(overhead.len(), 1);
    assert_eq!(overhead[0].runtime, "node");
    assert!((overhead[0].delta_percent - 30.0).abs() < 1e-9);
}

#[test]
fn test_run_id_round_trip_matches_directory() {
    let id: RunId = "node_w1_rest_3_oteltrue".parse().unwrap();
    assert_eq!(id.workload, "w1_rest");
    assert_eq!(id.replicate_id, 3);
    assert_eq!(id.to_string(), "node_w1_rest_3_oteltrue");
}
