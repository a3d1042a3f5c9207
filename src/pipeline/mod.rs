//! The report pipeline: artifacts, stages, dependency graph and driver.
//!
//! Hand-offs between stages are files in the report directory; every hand-off
//! is declared as an artifact so the scheduler can check the whole contract
//! before the first stage runs.

pub mod artifact;
pub mod driver;
pub mod graph;
pub mod stage;

pub use artifact::{ArtifactId, ArtifactPaths, TRACKING_STORE_FILE};
pub use driver::{Driver, StageTiming};
pub use graph::StageGraph;
pub use stage::{RunContext, Stage, ToolStage};
