//! Economic analysis
//!
//! SLO-conditioned throughput, cost per success, and the telemetry overhead
//! comparison, computed either from frontier sweeps or from aggregates.

pub mod analyzer;
pub mod frontier;
pub mod overhead;
pub mod slo;

pub use analyzer::{EconomicAnalyzer, EconomicSummary};
pub use frontier::{load_frontier, parse_frontier, FrontierLoad};
pub use overhead::{OverheadComparator, OverheadObservation, OverheadRow};
pub use slo::{CostPerSuccess, MaxStableThroughput, SloPolicy, DEFAULT_SLO_MS};
