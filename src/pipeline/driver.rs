//! Sequential pipeline executor.
//!
//! Strictly linear: each stage blocks until completion, the first failure
//! aborts everything downstream, and partially written artifacts stay where
//! they are (re-running starts from the first stage and overwrites them).

use super::graph::StageGraph;
use super::stage::RunContext;
use crate::errors::Result;
use std::time::{Duration, Instant};

/// Timing information for a pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    /// Name of the stage
    pub name: String,

    /// Time taken to execute the stage
    pub duration: Duration,
}

impl StageTiming {
    /// Format the timing as a human-readable string.
    pub fn format(&self) -> String {
        format!("{}: {:.2}s", self.name, self.duration.as_secs_f64())
    }
}

/// Executes a validated stage graph in topological order.
pub struct Driver {
    graph: StageGraph,
}

impl Driver {
    pub fn new(graph: StageGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Run every stage in order, failing fast on the first error.
    ///
    /// Returns per-stage wall-clock timings on full success.
    pub fn run(&self, ctx: &RunContext<'_>) -> Result<Vec<StageTiming>> {
        let order = self.graph.execution_order()?;
        let total = order.len();
        let mut timings = Vec::with_capacity(total);

        for (i, index) in order.into_iter().enumerate() {
            let stage = self.graph.stage(index);
            log::info!("Stage {}/{}: {}", i + 1, total, stage.name());

            let start = Instant::now();
            stage.run(ctx)?;
            timings.push(StageTiming {
                name: stage.name().to_string(),
                duration: start.elapsed(),
            });
        }

        Ok(timings)
    }
}
