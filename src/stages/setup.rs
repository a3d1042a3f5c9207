//! The setup stage: establish the run's report directory.

use crate::errors::{PipelineError, Result};
use crate::pipeline::artifact::ArtifactId;
use crate::pipeline::stage::{RunContext, Stage};
use std::fs;
use std::path::Path;

/// Name of the optional record-info file copied from beside the trace data.
const RECORD_INFO_FILE: &str = "record_info.yaml";

/// Creates the report directory (idempotently) and copies the descriptor
/// files into it. Copy, not move: the source configuration files stay
/// untouched. A record-info file inside the trace directory is carried along
/// when present.
pub struct SetupStage {
    inputs: [ArtifactId; 3],
    outputs: [ArtifactId; 2],
}

impl SetupStage {
    pub fn new() -> Self {
        Self {
            inputs: [
                ArtifactId::TraceData,
                ArtifactId::ComponentList,
                ArtifactId::TargetPathList,
            ],
            outputs: [ArtifactId::ComponentListCopy, ArtifactId::TargetPathListCopy],
        }
    }
}

impl Default for SetupStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SetupStage {
    fn name(&self) -> &str {
        "setup"
    }

    fn inputs(&self) -> &[ArtifactId] {
        &self.inputs
    }

    fn outputs(&self) -> &[ArtifactId] {
        &self.outputs
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<()> {
        let report_dir = ctx.config.report_dir();
        fs::create_dir_all(&report_dir).map_err(|e| {
            PipelineError::file_system("failed to create report directory", &report_dir, e)
        })?;

        copy_into(
            &ctx.config.component_list_json,
            ctx.paths.require(ArtifactId::ComponentListCopy)?,
        )?;
        copy_into(
            &ctx.config.target_path_json,
            ctx.paths.require(ArtifactId::TargetPathListCopy)?,
        )?;

        let record_info = ctx.config.trace_data.join(RECORD_INFO_FILE);
        if record_info.is_file() {
            copy_into(&record_info, &report_dir.join(RECORD_INFO_FILE))?;
        }

        Ok(())
    }
}

fn copy_into(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| PipelineError::file_system("failed to copy into report directory", from, e))
}
