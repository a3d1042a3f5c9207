//! Shared error types for the report pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for traceval operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration errors (flag combinations, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A mandatory input file or directory does not exist
    #[error("Missing {role}: {}", .path.display())]
    MissingInput { role: &'static str, path: PathBuf },

    /// File system related errors with path context
    #[error("File system error: {message} (path: {})", .path.display())]
    FileSystem {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Stage graph validation errors (missing producer, duplicate producer, cycle)
    #[error("Stage graph error: {0}")]
    Graph(String),

    /// An external analysis tool could not be located
    #[error("Analysis tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An invoked stage exited nonzero; the child's code becomes the process exit code
    #[error("Stage '{stage}' failed with exit code {exit_code}")]
    StageFailed { stage: String, exit_code: i32 },

    /// Another writer holds the tracking store lock
    #[error("Tracking store is locked by another run: {}", .lock_path.display())]
    TrackingLocked { lock_path: PathBuf },

    /// The tracking store or stats file could not be parsed
    #[error("Tracking error: {message} (file: {})", .path.display())]
    Tracking { message: String, path: PathBuf },

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create a missing-input error for a mandatory path
    pub fn missing_input(role: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            role,
            path: path.into(),
        }
    }

    /// Create a tracking error with file context
    pub fn tracking(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Tracking {
            message: message.into(),
            path: path.into(),
        }
    }

    /// The process exit code this error maps to.
    ///
    /// A failed stage propagates the child's own exit code; everything else
    /// is a plain failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageFailed { exit_code, .. } if *exit_code > 0 => *exit_code,
            _ => 1,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, PipelineError>;
