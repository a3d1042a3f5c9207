//! The concrete report pipeline.
//!
//! Builds the stage set for one run from its configuration. The listing
//! below is already in dependency order, so the scheduler executes it as
//! written; the declarations are still what the scheduler trusts, not the
//! order. Rendering is single-pass: the callback renderer takes the topic
//! validation report as an input instead of being re-run after the topic
//! stage.

pub mod setup;

use crate::config::RunConfig;
use crate::pipeline::artifact::{ArtifactId, ArtifactPaths};
use crate::pipeline::stage::{Stage, ToolStage};
use crate::tracking::TrackResponseTime;
use setup::SetupStage;
use std::ffi::OsString;
use std::path::Path;

/// External tool names, resolved from the tool directory or `PATH`.
pub mod tools {
    pub const TOPIC_EXPECTATIONS: &str = "trace-topic-expectations";
    pub const VALIDATE_CALLBACK: &str = "trace-validate-callback";
    pub const VALIDATE_TOPIC: &str = "trace-validate-topic";
    pub const RENDER_CALLBACK: &str = "trace-render-callback";
    pub const RENDER_TOPIC: &str = "trace-render-topic";
    pub const FAILURE_SUMMARY: &str = "trace-failure-summary";
    pub const AUGMENT_ARCHITECTURE: &str = "trace-augment-architecture";
    pub const ANALYZE_PATH: &str = "trace-analyze-path";
    pub const RENDER_PATH: &str = "trace-render-path";
    pub const RENDER_TOP: &str = "trace-render-top";
}

/// Artifacts supplied by this configuration rather than produced by a stage.
pub fn source_artifacts(config: &RunConfig) -> Vec<ArtifactId> {
    let mut sources = vec![
        ArtifactId::TraceData,
        ArtifactId::ComponentList,
        ArtifactId::TargetPathList,
    ];
    if config.note_text_top.is_some() {
        sources.push(ArtifactId::NoteTextTop);
    }
    if config.note_text_bottom.is_some() {
        sources.push(ArtifactId::NoteTextBottom);
    }
    sources
}

/// Assemble the full pipeline for this run.
pub fn build_stages(config: &RunConfig, paths: &ArtifactPaths) -> Vec<Box<dyn Stage>> {
    let builder = Args::new(config, paths);
    let tracking = config.report_store_dir.is_some();

    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(SetupStage::new()),
        Box::new(topic_expectations(&builder)),
        Box::new(validate_callbacks(&builder)),
        Box::new(validate_topics(&builder)),
        Box::new(render_callback_report(&builder)),
        Box::new(render_topic_report(&builder)),
        Box::new(failure_summary(&builder)),
        Box::new(augment_architecture(&builder)),
        Box::new(analyze_paths(&builder)),
        Box::new(render_path_report(&builder)),
    ];
    if tracking {
        stages.push(Box::new(TrackResponseTime::new()));
    }
    stages.push(Box::new(render_top_report(&builder, tracking)));
    stages
}

/// Argument-vector assembly against resolved artifact paths.
struct Args<'a> {
    config: &'a RunConfig,
    paths: &'a ArtifactPaths,
}

impl<'a> Args<'a> {
    fn new(config: &'a RunConfig, paths: &'a ArtifactPaths) -> Self {
        Self { config, paths }
    }

    fn path_of(&self, id: ArtifactId) -> OsString {
        self.paths
            .get(id)
            .map(|p| p.as_os_str().to_os_string())
            .unwrap_or_default()
    }

    fn strip_and_time_args(&self, args: &mut Vec<OsString>) {
        push_flag_value(args, "--start-strip", self.config.start_strip.to_string());
        push_flag_value(args, "--end-strip", self.config.end_strip.to_string());
        if self.config.sim_time {
            args.push("--sim-time".into());
        }
    }
}

fn push_flag_value(args: &mut Vec<OsString>, flag: &str, value: impl Into<OsString>) {
    args.push(flag.into());
    args.push(value.into());
}

fn push_path(args: &mut Vec<OsString>, flag: &str, path: &Path) {
    args.push(flag.into());
    args.push(path.as_os_str().to_os_string());
}

fn topic_expectations(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TraceData)];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(
        &mut args,
        "--output",
        b.path_of(ArtifactId::TopicExpectations),
    );
    ToolStage::new(
        "generate topic expectations",
        tools::TOPIC_EXPECTATIONS,
        args,
        vec![ArtifactId::TraceData, ArtifactId::ComponentListCopy],
        vec![ArtifactId::TopicExpectations],
    )
}

fn validate_callbacks(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TraceData)];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(
        &mut args,
        "--output",
        b.path_of(ArtifactId::CallbackValidation),
    );
    b.strip_and_time_args(&mut args);
    ToolStage::new(
        "validate callbacks",
        tools::VALIDATE_CALLBACK,
        args,
        vec![ArtifactId::TraceData, ArtifactId::ComponentListCopy],
        vec![ArtifactId::CallbackValidation],
    )
}

fn validate_topics(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TraceData)];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(
        &mut args,
        "--expectation",
        b.path_of(ArtifactId::TopicExpectations),
    );
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::TopicValidation));
    b.strip_and_time_args(&mut args);
    ToolStage::new(
        "validate topics",
        tools::VALIDATE_TOPIC,
        args,
        vec![
            ArtifactId::TraceData,
            ArtifactId::ComponentListCopy,
            ArtifactId::TopicExpectations,
        ],
        vec![ArtifactId::TopicValidation],
    )
}

/// Single rendering pass: the topic validation report is an input, so the
/// callback page carries its topic cross-links the first and only time it is
/// written.
fn render_callback_report(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::CallbackValidation)];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(
        &mut args,
        "--topic-report",
        b.path_of(ArtifactId::TopicValidation),
    );
    push_flag_value(
        &mut args,
        "--output",
        b.path_of(ArtifactId::CallbackReportHtml),
    );
    ToolStage::new(
        "render callback report",
        tools::RENDER_CALLBACK,
        args,
        vec![
            ArtifactId::CallbackValidation,
            ArtifactId::TopicValidation,
            ArtifactId::ComponentListCopy,
        ],
        vec![ArtifactId::CallbackReportHtml],
    )
}

fn render_topic_report(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TopicValidation)];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::TopicReportHtml));
    ToolStage::new(
        "render topic report",
        tools::RENDER_TOPIC,
        args,
        vec![ArtifactId::TopicValidation, ArtifactId::ComponentListCopy],
        vec![ArtifactId::TopicReportHtml],
    )
}

fn failure_summary(b: &Args<'_>) -> ToolStage {
    let mut args = Vec::new();
    push_flag_value(
        &mut args,
        "--callback-report",
        b.path_of(ArtifactId::CallbackValidation),
    );
    push_flag_value(
        &mut args,
        "--topic-report",
        b.path_of(ArtifactId::TopicValidation),
    );
    push_flag_value(
        &mut args,
        "--output",
        b.path_of(ArtifactId::FailureSummaryHtml),
    );
    ToolStage::new(
        "report trace-validation failures",
        tools::FAILURE_SUMMARY,
        args,
        vec![ArtifactId::CallbackValidation, ArtifactId::TopicValidation],
        vec![ArtifactId::FailureSummaryHtml],
    )
}

/// Path discovery is bounded by depth and a wall-clock budget; the tool owns
/// timing out gracefully, the driver never kills it.
fn augment_architecture(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TraceData)];
    push_flag_value(
        &mut args,
        "--target-path",
        b.path_of(ArtifactId::TargetPathListCopy),
    );
    push_flag_value(
        &mut args,
        "--max-node-depth",
        b.config.max_node_depth.to_string(),
    );
    push_flag_value(&mut args, "--timeout", b.config.timeout_secs.to_string());
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::ArchitectureFile));
    ToolStage::new(
        "augment architecture",
        tools::AUGMENT_ARCHITECTURE,
        args,
        vec![ArtifactId::TraceData, ArtifactId::TargetPathListCopy],
        vec![ArtifactId::ArchitectureFile],
    )
}

fn analyze_paths(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::TraceData)];
    push_flag_value(
        &mut args,
        "--architecture",
        b.path_of(ArtifactId::ArchitectureFile),
    );
    push_path(&mut args, "--dest-dir", &b.config.report_dir());
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::PathStats));
    b.strip_and_time_args(&mut args);
    if b.config.draw_all_message_flow {
        args.push("--message-flow".into());
    }
    ToolStage::new(
        "analyze paths",
        tools::ANALYZE_PATH,
        args,
        vec![ArtifactId::TraceData, ArtifactId::ArchitectureFile],
        vec![ArtifactId::PathStats],
    )
}

fn render_path_report(b: &Args<'_>) -> ToolStage {
    let mut args = vec![b.path_of(ArtifactId::PathStats)];
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::PathReportHtml));
    ToolStage::new(
        "render path report",
        tools::RENDER_PATH,
        args,
        vec![ArtifactId::PathStats],
        vec![ArtifactId::PathReportHtml],
    )
}

fn render_top_report(b: &Args<'_>, tracking: bool) -> ToolStage {
    let mut args = vec![b.config.report_dir().into_os_string()];
    push_flag_value(
        &mut args,
        "--component-list",
        b.path_of(ArtifactId::ComponentListCopy),
    );
    push_flag_value(&mut args, "--num-back", b.config.num_back.to_string());
    if let Some(note) = &b.config.note_text_top {
        push_path(&mut args, "--note-text-top", note);
    }
    if let Some(note) = &b.config.note_text_bottom {
        push_path(&mut args, "--note-text-bottom", note);
    }
    if tracking {
        push_flag_value(
            &mut args,
            "--tracking-store",
            b.path_of(ArtifactId::TrackingStore),
        );
    }
    push_flag_value(&mut args, "--output", b.path_of(ArtifactId::TopReportHtml));

    let mut inputs = vec![
        ArtifactId::ComponentListCopy,
        ArtifactId::CallbackReportHtml,
        ArtifactId::TopicReportHtml,
        ArtifactId::FailureSummaryHtml,
        ArtifactId::PathReportHtml,
    ];
    if b.config.note_text_top.is_some() {
        inputs.push(ArtifactId::NoteTextTop);
    }
    if b.config.note_text_bottom.is_some() {
        inputs.push(ArtifactId::NoteTextBottom);
    }
    if tracking {
        inputs.push(ArtifactId::TrackingStore);
    }

    ToolStage::new(
        "render top-level report",
        tools::RENDER_TOP,
        args,
        inputs,
        vec![ArtifactId::TopReportHtml],
    )
}
