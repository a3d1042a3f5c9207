// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod exec;
pub mod pipeline;
pub mod stages;
pub mod tracking;

// Re-export commonly used types
pub use crate::config::RunConfig;
pub use crate::errors::{PipelineError, Result};
pub use crate::pipeline::{
    ArtifactId, ArtifactPaths, Driver, RunContext, Stage, StageGraph, StageTiming, ToolStage,
};
pub use crate::tracking::{TrackingEntry, TrackingStore};
