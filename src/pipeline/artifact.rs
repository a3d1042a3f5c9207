//! Artifact identities and the report directory layout.
//!
//! Every file handed between stages has a stable identity here. Producer and
//! consumer stages declare these IDs instead of relying on call order, which
//! lets the scheduler check the whole hand-off contract before anything runs.

use crate::config::RunConfig;
use crate::errors::{PipelineError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the cross-run tracking store inside the report store.
pub const TRACKING_STORE_FILE: &str = "response_time_tracking.json";

/// Identity of a file handed between stages, or supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactId {
    // Supplied by configuration; never produced by a stage.
    TraceData,
    ComponentList,
    TargetPathList,
    NoteTextTop,
    NoteTextBottom,

    // Produced inside the report directory.
    ComponentListCopy,
    TargetPathListCopy,
    TopicExpectations,
    CallbackValidation,
    TopicValidation,
    CallbackReportHtml,
    TopicReportHtml,
    FailureSummaryHtml,
    ArchitectureFile,
    PathStats,
    PathReportHtml,
    TopReportHtml,

    // Produced inside the report store directory.
    TrackingStore,
}

impl ArtifactId {
    /// Whether this artifact is supplied by configuration rather than a stage.
    pub fn is_source(self) -> bool {
        matches!(
            self,
            Self::TraceData
                | Self::ComponentList
                | Self::TargetPathList
                | Self::NoteTextTop
                | Self::NoteTextBottom
        )
    }

    /// Canonical file name inside the report directory, for produced files.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            Self::ComponentListCopy => Some("component_list.json"),
            Self::TargetPathListCopy => Some("target_path.json"),
            Self::TopicExpectations => Some("expectation_topic.csv"),
            Self::CallbackValidation => Some("validate_callback.yaml"),
            Self::TopicValidation => Some("validate_topic.yaml"),
            Self::CallbackReportHtml => Some("index_callback.html"),
            Self::TopicReportHtml => Some("index_topic.html"),
            Self::FailureSummaryHtml => Some("trace_failure.html"),
            Self::ArchitectureFile => Some("architecture_path.yaml"),
            Self::PathStats => Some("stats_path.yaml"),
            Self::PathReportHtml => Some("index_path.html"),
            Self::TopReportHtml => Some("index.html"),
            _ => None,
        }
    }

    /// Short human-readable name for plans and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::TraceData => "trace data",
            Self::ComponentList => "component descriptor",
            Self::TargetPathList => "target-path descriptor",
            Self::NoteTextTop => "note text (top)",
            Self::NoteTextBottom => "note text (bottom)",
            Self::TrackingStore => TRACKING_STORE_FILE,
            other => other.file_name().unwrap_or("artifact"),
        }
    }
}

/// Resolved absolute locations for every artifact of one run.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    map: BTreeMap<ArtifactId, PathBuf>,
}

impl ArtifactPaths {
    /// Resolve every artifact this configuration can name.
    ///
    /// Optional artifacts (note texts, tracking store) are present only when
    /// the configuration provides their location.
    pub fn resolve(config: &RunConfig) -> Self {
        let report_dir = config.report_dir();
        let mut map = BTreeMap::new();

        map.insert(ArtifactId::TraceData, config.trace_data.clone());
        map.insert(ArtifactId::ComponentList, config.component_list_json.clone());
        map.insert(ArtifactId::TargetPathList, config.target_path_json.clone());
        if let Some(path) = &config.note_text_top {
            map.insert(ArtifactId::NoteTextTop, path.clone());
        }
        if let Some(path) = &config.note_text_bottom {
            map.insert(ArtifactId::NoteTextBottom, path.clone());
        }

        for id in [
            ArtifactId::ComponentListCopy,
            ArtifactId::TargetPathListCopy,
            ArtifactId::TopicExpectations,
            ArtifactId::CallbackValidation,
            ArtifactId::TopicValidation,
            ArtifactId::CallbackReportHtml,
            ArtifactId::TopicReportHtml,
            ArtifactId::FailureSummaryHtml,
            ArtifactId::ArchitectureFile,
            ArtifactId::PathStats,
            ArtifactId::PathReportHtml,
            ArtifactId::TopReportHtml,
        ] {
            if let Some(name) = id.file_name() {
                map.insert(id, report_dir.join(name));
            }
        }

        if let Some(store) = &config.report_store_dir {
            map.insert(ArtifactId::TrackingStore, store.join(TRACKING_STORE_FILE));
        }

        Self { map }
    }

    pub fn get(&self, id: ArtifactId) -> Option<&Path> {
        self.map.get(&id).map(PathBuf::as_path)
    }

    /// Path of an artifact a stage declared; absence is a wiring bug.
    pub fn require(&self, id: ArtifactId) -> Result<&Path> {
        self.get(id).ok_or_else(|| {
            PipelineError::Graph(format!("no resolved path for artifact '{}'", id.label()))
        })
    }
}
