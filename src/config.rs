//! Immutable run configuration.
//!
//! A `RunConfig` is constructed once at startup from the CLI (each option is
//! also readable from an environment variable of the same name) and passed by
//! reference into the driver. Nothing reads ambient process state after
//! construction.

use crate::errors::{PipelineError, Result};
use std::path::PathBuf;

/// Directory all report directories are created under.
pub const OUTPUT_ROOT: &str = "output";

/// Prefix of every report directory name.
pub const REPORT_DIR_PREFIX: &str = "val_";

/// The flat, validated set of named parameters for one run.
///
/// Immutable for the duration of the run; created once at process start and
/// discarded at exit.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory of the captured trace to analyze
    pub trace_data: PathBuf,
    /// Component descriptor consumed by the validation stages
    pub component_list_json: PathBuf,
    /// Target-path descriptor consumed by the path-analysis stages
    pub target_path_json: PathBuf,
    /// Upper bound on graph traversal depth during path discovery
    pub max_node_depth: u32,
    /// Wall-clock budget in seconds for path discovery
    pub timeout_secs: u64,
    /// Render message-flow diagrams for every path instead of only flagged ones
    pub draw_all_message_flow: bool,
    /// Archival directory where successive runs' reports accumulate
    pub report_store_dir: Option<PathBuf>,
    /// Record store links relative to the archival directory
    pub relpath_from_report_store_dir: bool,
    /// Interpret timestamps as simulation time instead of wall-clock
    pub sim_time: bool,
    /// Free-text file inserted verbatim at the top of the top-level report
    pub note_text_top: Option<PathBuf>,
    /// Free-text file inserted verbatim at the bottom of the top-level report
    pub note_text_bottom: Option<PathBuf>,
    /// Leading trace samples to discard before analysis
    pub start_strip: u64,
    /// Trailing trace samples to discard before analysis
    pub end_strip: u64,
    /// How many historical runs the top-level report links for trend navigation
    pub num_back: usize,
    /// Directory holding the external analysis tools; `PATH` lookup when unset
    pub tool_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Validate presence of mandatory inputs and flag consistency.
    ///
    /// Fails fast: the pipeline never starts with a broken configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.trace_data.is_dir() {
            return Err(PipelineError::missing_input(
                "trace data directory",
                &self.trace_data,
            ));
        }
        if !self.component_list_json.is_file() {
            return Err(PipelineError::missing_input(
                "component descriptor",
                &self.component_list_json,
            ));
        }
        if !self.target_path_json.is_file() {
            return Err(PipelineError::missing_input(
                "target-path descriptor",
                &self.target_path_json,
            ));
        }
        for (role, note) in [
            ("note text (top)", &self.note_text_top),
            ("note text (bottom)", &self.note_text_bottom),
        ] {
            if let Some(path) = note {
                if !path.is_file() {
                    return Err(PipelineError::missing_input(role, path));
                }
            }
        }
        if let Some(dir) = &self.tool_dir {
            if !dir.is_dir() {
                return Err(PipelineError::missing_input("tool directory", dir));
            }
        }
        if self.relpath_from_report_store_dir && self.report_store_dir.is_none() {
            return Err(PipelineError::Config(
                "relpath_from_report_store_dir requires report_store_dir".to_string(),
            ));
        }
        Ok(())
    }

    /// Base name of the trace data directory, insensitive to trailing slashes.
    pub fn trace_name(&self) -> String {
        self.trace_data
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| {
                self.trace_data
                    .to_string_lossy()
                    .trim_matches('/')
                    .replace('/', "_")
            })
    }

    /// Report directory for this run: `output/val_<basename of trace_data>`.
    ///
    /// Purely a naming rule; creation happens in the setup stage and is
    /// idempotent.
    pub fn report_dir(&self) -> PathBuf {
        PathBuf::from(OUTPUT_ROOT).join(format!("{}{}", REPORT_DIR_PREFIX, self.trace_name()))
    }
}
