//! Cross-run response-time tracking store.
//!
//! The only state that outlives a single run. The store is a JSON file in the
//! report store directory with one entry per run, keyed by the report
//! directory name; re-running a trace replaces its entry in place. Writes go
//! through a temp file plus rename and are guarded by an advisory lock file:
//! the store has a single-writer contract, and a held lock is an immediate
//! error rather than a wait.

use crate::config::RunConfig;
use crate::errors::{PipelineError, Result};
use crate::pipeline::artifact::ArtifactId;
use crate::pipeline::stage::{RunContext, Stage};
use crate::pipeline::TRACKING_STORE_FILE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Lock file guarding the tracking store against concurrent writers.
const LOCK_FILE: &str = "response_time_tracking.lock";

/// Per-path response-time figures recorded for trend tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResponseTime {
    pub path_name: String,
    /// Average best-case response time; absent when the path carried no traffic
    pub best_avg: Option<f64>,
    /// Average worst-case response time; absent when the path carried no traffic
    pub worst_avg: Option<f64>,
}

/// One run's entry in the tracking store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Report directory name, e.g. `val_session_01`
    pub run: String,
    pub recorded_at: DateTime<Utc>,
    /// Report location; relative to the store when the relpath option is set
    pub report_path: String,
    pub paths: Vec<PathResponseTime>,
}

/// The whole store, ordered by first appearance of each run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingStore {
    pub entries: Vec<TrackingEntry>,
}

impl TrackingStore {
    /// Load the store, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| PipelineError::tracking(format!("corrupt store: {e}"), path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(PipelineError::file_system(
                "failed to read tracking store",
                path,
                e,
            )),
        }
    }

    /// Insert or replace the entry for `entry.run`.
    pub fn upsert(&mut self, entry: TrackingEntry) {
        match self.entries.iter_mut().find(|e| e.run == entry.run) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    /// Write atomically next to the final location.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, text)
            .map_err(|e| PipelineError::file_system("failed to write tracking store", &tmp, e))?;
        fs::rename(&tmp, path)
            .map_err(|e| PipelineError::file_system("failed to replace tracking store", path, e))
    }
}

/// Advisory single-writer lock on the store directory.
///
/// Created with `create_new`; released (best effort) on drop. A lock held by
/// another run is an error, not a wait.
pub struct StoreLock {
    lock_path: PathBuf,
}

impl StoreLock {
    pub fn acquire(store_dir: &Path) -> Result<Self> {
        let lock_path = store_dir.join(LOCK_FILE);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(Self { lock_path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(PipelineError::TrackingLocked { lock_path })
            }
            Err(e) => Err(PipelineError::file_system(
                "failed to create store lock",
                &lock_path,
                e,
            )),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// A per-path stat value in `stats_path.yaml`.
///
/// The path analyzer writes the placeholder `---` for paths that carried no
/// traffic; those parse to an absent value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Num(f64),
    Text(String),
    #[default]
    Missing,
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(v) => Some(*v),
            _ => None,
        }
    }
}

/// The subset of the path analyzer's stats schema the tracker needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PathStat {
    pub target_path_name: String,
    #[serde(default)]
    pub best_avg: StatValue,
    #[serde(default)]
    pub worst_avg: StatValue,
}

/// Parse per-path response times out of `stats_path.yaml`.
pub fn read_path_stats(stats_path: &Path) -> Result<Vec<PathResponseTime>> {
    let text = fs::read_to_string(stats_path)
        .map_err(|e| PipelineError::file_system("failed to read path stats", stats_path, e))?;
    let stats: Vec<PathStat> = serde_yaml::from_str(&text)
        .map_err(|e| PipelineError::tracking(format!("unreadable path stats: {e}"), stats_path))?;

    Ok(stats
        .into_iter()
        .map(|stat| PathResponseTime {
            path_name: stat.target_path_name,
            best_avg: stat.best_avg.as_f64(),
            worst_avg: stat.worst_avg.as_f64(),
        })
        .collect())
}

/// Record this run in the store under the lock.
pub fn record_run(config: &RunConfig, stats_path: &Path) -> Result<()> {
    let store_dir = config.report_store_dir.as_deref().ok_or_else(|| {
        PipelineError::Config("response-time tracking requires report_store_dir".to_string())
    })?;
    fs::create_dir_all(store_dir)
        .map_err(|e| PipelineError::file_system("failed to create report store", store_dir, e))?;

    let _lock = StoreLock::acquire(store_dir)?;
    let store_path = store_dir.join(TRACKING_STORE_FILE);

    let mut store = TrackingStore::load(&store_path)?;
    store.upsert(TrackingEntry {
        run: report_run_name(config),
        recorded_at: Utc::now(),
        report_path: report_link(config, store_dir)?,
        paths: read_path_stats(stats_path)?,
    });
    store.save(&store_path)
}

fn report_run_name(config: &RunConfig) -> String {
    config
        .report_dir()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.trace_name())
}

/// The report location recorded in the store, honoring the relpath option.
fn report_link(config: &RunConfig, store_dir: &Path) -> Result<String> {
    let report_dir = absolute(&config.report_dir())?;
    let link = if config.relpath_from_report_store_dir {
        let store = absolute(store_dir)?;
        pathdiff::diff_paths(&report_dir, &store).unwrap_or(report_dir)
    } else {
        report_dir
    };
    Ok(link.to_string_lossy().into_owned())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| PipelineError::file_system("failed to get working directory", ".", e))?;
        Ok(cwd.join(path))
    }
}

/// The tracking stage: the only stage whose state outlives a single run.
pub struct TrackResponseTime {
    inputs: [ArtifactId; 1],
    outputs: [ArtifactId; 1],
}

impl TrackResponseTime {
    pub fn new() -> Self {
        Self {
            inputs: [ArtifactId::PathStats],
            outputs: [ArtifactId::TrackingStore],
        }
    }
}

impl Default for TrackResponseTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TrackResponseTime {
    fn name(&self) -> &str {
        "track response time"
    }

    fn inputs(&self) -> &[ArtifactId] {
        &self.inputs
    }

    fn outputs(&self) -> &[ArtifactId] {
        &self.outputs
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<()> {
        let stats_path = ctx.paths.require(ArtifactId::PathStats)?;
        record_run(ctx.config, stats_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const STATS_YAML: &str = indoc! {"
        - target_path_name: sensing_to_planning
          best_avg: 12.5
          worst_avg: 20.125
        - target_path_name: idle_path
          best_avg: '---'
          worst_avg: '---'
    "};

    fn config_with_store(trace: &Path, store: &Path) -> RunConfig {
        RunConfig {
            trace_data: trace.to_path_buf(),
            component_list_json: PathBuf::from("component_list.json"),
            target_path_json: PathBuf::from("target_path.json"),
            max_node_depth: 20,
            timeout_secs: 120,
            draw_all_message_flow: false,
            report_store_dir: Some(store.to_path_buf()),
            relpath_from_report_store_dir: false,
            sim_time: false,
            note_text_top: None,
            note_text_bottom: None,
            start_strip: 0,
            end_strip: 0,
            num_back: 3,
            tool_dir: None,
        }
    }

    #[test]
    fn stats_placeholders_parse_to_absent_values() {
        let dir = TempDir::new().unwrap();
        let stats = dir.path().join("stats_path.yaml");
        fs::write(&stats, STATS_YAML).unwrap();

        let paths = read_path_stats(&stats).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].path_name, "sensing_to_planning");
        assert_eq!(paths[0].best_avg, Some(12.5));
        assert_eq!(paths[0].worst_avg, Some(20.125));
        assert_eq!(paths[1].best_avg, None);
        assert_eq!(paths[1].worst_avg, None);
    }

    #[test]
    fn unreadable_stats_are_a_tracking_error() {
        let dir = TempDir::new().unwrap();
        let stats = dir.path().join("stats_path.yaml");
        fs::write(&stats, "not a list").unwrap();

        let err = read_path_stats(&stats).unwrap_err();
        assert!(matches!(err, PipelineError::Tracking { .. }));
    }

    #[test]
    fn record_run_appends_and_then_replaces() {
        let dir = TempDir::new().unwrap();
        let trace_a = dir.path().join("session_a");
        let trace_b = dir.path().join("session_b");
        fs::create_dir(&trace_a).unwrap();
        fs::create_dir(&trace_b).unwrap();
        let store = dir.path().join("store");
        let stats = dir.path().join("stats_path.yaml");
        fs::write(&stats, STATS_YAML).unwrap();

        record_run(&config_with_store(&trace_a, &store), &stats).unwrap();
        record_run(&config_with_store(&trace_b, &store), &stats).unwrap();
        // Re-running session_a must update in place, not append.
        record_run(&config_with_store(&trace_a, &store), &stats).unwrap();

        let loaded = TrackingStore::load(&store.join(TRACKING_STORE_FILE)).unwrap();
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[0].run, "val_session_a");
        assert_eq!(loaded.entries[1].run, "val_session_b");
        assert_eq!(loaded.entries[0].paths[0].best_avg, Some(12.5));
    }

    #[test]
    fn relpath_option_records_store_relative_links() {
        let dir = TempDir::new().unwrap();
        let trace = dir.path().join("session_rel");
        fs::create_dir(&trace).unwrap();
        let store = dir.path().join("store");
        let stats = dir.path().join("stats_path.yaml");
        fs::write(&stats, STATS_YAML).unwrap();

        let mut config = config_with_store(&trace, &store);
        config.relpath_from_report_store_dir = true;
        record_run(&config, &stats).unwrap();

        let loaded = TrackingStore::load(&store.join(TRACKING_STORE_FILE)).unwrap();
        let link = &loaded.entries[0].report_path;
        assert!(
            !Path::new(link).is_absolute(),
            "expected a store-relative link, got {link}"
        );
        assert!(link.ends_with("val_session_rel"));
    }

    #[test]
    fn held_lock_rejects_a_second_writer() {
        let dir = TempDir::new().unwrap();
        let trace = dir.path().join("session_lock");
        fs::create_dir(&trace).unwrap();
        let store = dir.path().join("store");
        fs::create_dir(&store).unwrap();
        let stats = dir.path().join("stats_path.yaml");
        fs::write(&stats, STATS_YAML).unwrap();

        let _lock = StoreLock::acquire(&store).unwrap();
        let err = record_run(&config_with_store(&trace, &store), &stats).unwrap_err();
        assert!(matches!(err, PipelineError::TrackingLocked { .. }));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = StoreLock::acquire(dir.path()).unwrap();
            assert!(dir.path().join(LOCK_FILE).exists());
        }
        assert!(!dir.path().join(LOCK_FILE).exists());
        // Reacquire after release.
        let _again = StoreLock::acquire(dir.path()).unwrap();
    }

    #[test]
    fn corrupt_store_is_reported_not_clobbered() {
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join(TRACKING_STORE_FILE);
        fs::write(&store_path, "{ not json").unwrap();

        let err = TrackingStore::load(&store_path).unwrap_err();
        assert!(matches!(err, PipelineError::Tracking { .. }));
        // The broken file is still there for inspection.
        assert!(store_path.exists());
    }
}
