//! Statistical aggregation
//!
//! - [`estimators`]: mean, standard deviation, median, nearest-rank
//!   percentile and the bootstrap mean interval
//! - [`grouping`]: immutable bucketing of replicates by experimental cell
//! - [`aggregator`]: per-cell [`AggregateStat`] computation
//! - [`coldstart`]: per-runtime cold-start summaries

pub mod aggregator;
pub mod coldstart;
pub mod estimators;
pub mod grouping;

pub use aggregator::{AggregateStat, StatisticalAggregator};
pub use coldstart::{summarize_cold_starts, ColdStartReport, ColdStartSummary, UnmeasuredRuntime};
pub use estimators::{bootstrap_mean_ci, BootstrapConfig, ConfidenceInterval};
pub use grouping::{group_replicates, GroupKey};
