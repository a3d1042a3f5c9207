//! External analysis tool resolution and invocation.
//!
//! The analysis engines are opaque collaborators reached over command-line
//! contracts. Binaries come from the configured tool directory or from
//! `PATH`; children inherit stdio, block until completion, and a nonzero
//! exit becomes a stage failure carrying the child's code.

use crate::errors::{PipelineError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locate an analysis tool binary.
pub fn resolve_tool(tool: &str, tool_dir: Option<&Path>) -> Result<PathBuf> {
    match tool_dir {
        Some(dir) => {
            let candidate = dir.join(tool);
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(PipelineError::ToolNotFound {
                    tool: candidate.display().to_string(),
                })
            }
        }
        None => which::which(tool).map_err(|_| PipelineError::ToolNotFound {
            tool: tool.to_string(),
        }),
    }
}

/// Run a tool to completion, mapping a nonzero exit to a stage failure.
///
/// A signal-terminated child reports no code; that is surfaced as exit
/// code 1.
pub fn run_tool(stage: &str, bin: &Path, args: &[OsString]) -> Result<()> {
    log::debug!(
        "{}: {} {}",
        stage,
        bin.display(),
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let status = Command::new(bin).args(args).status().map_err(|source| {
        PipelineError::file_system("failed to launch analysis tool", bin, source)
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::StageFailed {
            stage: stage.to_string(),
            exit_code: status.code().unwrap_or(1),
        })
    }
}
