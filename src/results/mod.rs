//! Processed result persistence
//!
//! JSON artifacts for every analysis output plus the flat aggregate CSV.

pub mod artifact;
pub mod io;

pub use artifact::{AnalysisArtifact, ArtifactKind};
pub use io::{
    aggregates_csv, ensure_dir, read_artifact, read_artifacts, write_aggregates_csv,
    write_artifact, AGGREGATES_CSV,
};
