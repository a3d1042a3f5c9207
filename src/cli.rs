use crate::config::RunConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "traceval")]
#[command(about = "Trace validation and path-latency report pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the full validation and latency report for a trace
    Report {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Validate the stage graph and print the execution plan without running anything
    Plan {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Pipeline options, each also readable from an environment variable of the
/// same name.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Root directory of the captured trace to analyze
    #[arg(long, env = "trace_data")]
    pub trace_data: PathBuf,

    /// Component descriptor consumed by the validation stages
    #[arg(long, env = "component_list_json")]
    pub component_list_json: PathBuf,

    /// Target-path descriptor consumed by the path-analysis stages
    #[arg(long, env = "target_path_json")]
    pub target_path_json: PathBuf,

    /// Upper bound on graph traversal depth during path discovery
    #[arg(long, env = "max_node_depth", default_value = "20")]
    pub max_node_depth: u32,

    /// Wall-clock budget in seconds for path discovery
    #[arg(long, env = "timeout", default_value = "120")]
    pub timeout: u64,

    /// Render message-flow diagrams for every path, not only flagged ones
    #[arg(long, env = "draw_all_message_flow")]
    pub draw_all_message_flow: bool,

    /// Archival directory where successive runs' reports accumulate
    #[arg(long, env = "report_store_dir")]
    pub report_store_dir: Option<PathBuf>,

    /// Record store links relative to the archival directory
    #[arg(long, env = "relpath_from_report_store_dir")]
    pub relpath_from_report_store_dir: bool,

    /// Interpret timestamps as simulation time instead of wall-clock
    #[arg(long, env = "sim_time")]
    pub sim_time: bool,

    /// Free-text file inserted verbatim at the top of the top-level report
    #[arg(long, env = "note_text_top")]
    pub note_text_top: Option<PathBuf>,

    /// Free-text file inserted verbatim at the bottom of the top-level report
    #[arg(long, env = "note_text_bottom")]
    pub note_text_bottom: Option<PathBuf>,

    /// Leading trace samples to discard before analysis
    #[arg(long, env = "start_strip", default_value = "0")]
    pub start_strip: u64,

    /// Trailing trace samples to discard before analysis
    #[arg(long, env = "end_strip", default_value = "0")]
    pub end_strip: u64,

    /// How many historical runs the top-level report links for trend navigation
    #[arg(long, env = "num_back", default_value = "3")]
    pub num_back: usize,

    /// Directory holding the external analysis tools (defaults to PATH lookup)
    #[arg(long, env = "tool_dir")]
    pub tool_dir: Option<PathBuf>,
}

impl PipelineArgs {
    /// Freeze these arguments into the run's immutable configuration.
    pub fn into_run_config(self) -> RunConfig {
        RunConfig {
            trace_data: self.trace_data,
            component_list_json: self.component_list_json,
            target_path_json: self.target_path_json,
            max_node_depth: self.max_node_depth,
            timeout_secs: self.timeout,
            draw_all_message_flow: self.draw_all_message_flow,
            report_store_dir: self.report_store_dir,
            relpath_from_report_store_dir: self.relpath_from_report_store_dir,
            sim_time: self.sim_time,
            note_text_top: self.note_text_top,
            note_text_bottom: self.note_text_bottom,
            start_strip: self.start_strip,
            end_strip: self.end_strip,
            num_back: self.num_back,
            tool_dir: self.tool_dir,
        }
    }
}
