//! Stage abstractions for the report pipeline.
//!
//! A stage declares the artifacts it reads and writes; the scheduler wires
//! stages together from those declarations. Most stages invoke an external
//! analysis program over its command-line contract; a few (setup, response
//! time tracking) run inside this process.

use super::artifact::{ArtifactId, ArtifactPaths};
use crate::config::RunConfig;
use crate::errors::Result;
use crate::exec;
use std::ffi::OsString;

/// Everything a stage may touch during one run.
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub paths: &'a ArtifactPaths,
}

/// A pipeline stage with declared artifact hand-offs.
///
/// `inputs()` must be produced by configuration or by an earlier stage;
/// `outputs()` must be unique across the pipeline. The scheduler verifies
/// both before execution.
pub trait Stage {
    /// Stage name for progress reporting and error messages.
    fn name(&self) -> &str;

    /// Artifacts this stage reads.
    fn inputs(&self) -> &[ArtifactId];

    /// Artifacts this stage writes.
    fn outputs(&self) -> &[ArtifactId];

    /// Execute this stage. Blocking; no retry.
    fn run(&self, ctx: &RunContext<'_>) -> Result<()>;
}

/// A stage that invokes one external analysis program.
///
/// The argument vector is fixed at construction from the resolved artifact
/// paths, so running a tool stage reads nothing but the tool directory from
/// the context. The child inherits stdio; its own diagnostics are the only
/// detail surfaced on failure.
pub struct ToolStage {
    name: String,
    tool: &'static str,
    args: Vec<OsString>,
    inputs: Vec<ArtifactId>,
    outputs: Vec<ArtifactId>,
}

impl ToolStage {
    pub fn new(
        name: impl Into<String>,
        tool: &'static str,
        args: Vec<OsString>,
        inputs: Vec<ArtifactId>,
        outputs: Vec<ArtifactId>,
    ) -> Self {
        Self {
            name: name.into(),
            tool,
            args,
            inputs,
            outputs,
        }
    }

    /// Name of the external program this stage invokes.
    pub fn tool(&self) -> &str {
        self.tool
    }

    /// The fixed argument vector handed to the tool.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Stage for ToolStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[ArtifactId] {
        &self.inputs
    }

    fn outputs(&self) -> &[ArtifactId] {
        &self.outputs
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<()> {
        let bin = exec::resolve_tool(self.tool, ctx.config.tool_dir.as_deref())?;
        exec::run_tool(&self.name, &bin, &self.args)
    }
}
