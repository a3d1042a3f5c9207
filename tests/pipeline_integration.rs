//! End-to-end tests driving the real binary against fake analysis tools.
//!
//! Each fake tool is a shell script that writes its `--output` argument, so
//! the whole orchestration contract (ordering, hand-offs, fail-fast,
//! exit-code propagation, the success banner) is exercised without any real
//! analysis engine.

#![cfg(unix)]

use assert_cmd::Command;
use indoc::indoc;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TOOLS: &[&str] = &[
    "trace-topic-expectations",
    "trace-validate-callback",
    "trace-validate-topic",
    "trace-render-callback",
    "trace-render-topic",
    "trace-failure-summary",
    "trace-augment-architecture",
    "trace-analyze-path",
    "trace-render-path",
    "trace-render-top",
];

/// Writes whatever follows `--output` and succeeds.
const GENERIC_TOOL: &str = indoc! {r#"
    #!/bin/sh
    out=""
    prev=""
    for a in "$@"; do
      if [ "$prev" = "--output" ]; then out="$a"; fi
      prev="$a"
    done
    if [ -n "$out" ]; then printf 'ok\n' > "$out"; fi
    exit 0
"#};

/// The path analyzer emits stats the tracking stage actually parses.
const ANALYZE_PATH_TOOL: &str = indoc! {r#"
    #!/bin/sh
    out=""
    prev=""
    for a in "$@"; do
      if [ "$prev" = "--output" ]; then out="$a"; fi
      prev="$a"
    done
    cat > "$out" <<'EOF'
    - target_path_name: main_path
      best_avg: 12.5
      worst_avg: 20.125
    - target_path_name: idle_path
      best_avg: '---'
      worst_avg: '---'
    EOF
    exit 0
"#};

struct Workspace {
    dir: TempDir,
    trace: PathBuf,
    component: PathBuf,
    target: PathBuf,
    tools: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let trace = dir.path().join("session_01");
        fs::create_dir(&trace).unwrap();
        fs::write(trace.join("trace_00.dat"), b"\x00\x01").unwrap();
        fs::write(trace.join("record_info.yaml"), "host: bench-01\n").unwrap();

        let component = dir.path().join("component_list.json");
        let target = dir.path().join("target_path.json");
        fs::write(&component, r#"{"component_list": []}"#).unwrap();
        fs::write(&target, r#"{"target_path_list": []}"#).unwrap();

        let tools = dir.path().join("tools");
        fs::create_dir(&tools).unwrap();
        for tool in TOOLS {
            let body = if *tool == "trace-analyze-path" {
                ANALYZE_PATH_TOOL
            } else {
                GENERIC_TOOL
            };
            write_tool(&tools, tool, body);
        }

        Self {
            dir,
            trace,
            component,
            target,
            tools,
        }
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::cargo_bin("traceval").unwrap();
        cmd.current_dir(self.dir.path())
            .arg(subcommand)
            .arg("--trace-data")
            .arg(&self.trace)
            .arg("--component-list-json")
            .arg(&self.component)
            .arg("--target-path-json")
            .arg(&self.target)
            .arg("--tool-dir")
            .arg(&self.tools);
        cmd
    }

    fn report_dir(&self) -> PathBuf {
        self.dir.path().join("output").join("val_session_01")
    }
}

fn write_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn full_run_produces_all_artifacts_and_one_banner() {
    let ws = Workspace::new();
    let output = ws.command("report").output().unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.matches("Trace report generated").count(),
        1,
        "expected exactly one success banner, got: {stdout}"
    );

    let report = ws.report_dir();
    for artifact in [
        "component_list.json",
        "target_path.json",
        "record_info.yaml",
        "expectation_topic.csv",
        "validate_callback.yaml",
        "validate_topic.yaml",
        "index_callback.html",
        "index_topic.html",
        "trace_failure.html",
        "architecture_path.yaml",
        "stats_path.yaml",
        "index_path.html",
        "index.html",
    ] {
        assert!(
            report.join(artifact).is_file(),
            "missing artifact {artifact}"
        );
    }
}

#[test]
fn failing_stage_propagates_its_exit_code_and_stops_the_pipeline() {
    let ws = Workspace::new();
    write_tool(&ws.tools, "trace-validate-topic", "#!/bin/sh\nexit 7\n");

    let output = ws.command("report").output().unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(
        !String::from_utf8_lossy(&output.stdout).contains("Trace report generated"),
        "no banner on failure"
    );

    let report = ws.report_dir();
    // Upstream artifacts were produced.
    assert!(report.join("expectation_topic.csv").is_file());
    assert!(report.join("validate_callback.yaml").is_file());
    // Nothing downstream of the failed stage ran, including the callback
    // renderer, which waits for the topic validation report.
    assert!(!report.join("index_callback.html").exists());
    assert!(!report.join("trace_failure.html").exists());
    assert!(!report.join("architecture_path.yaml").exists());
    assert!(!report.join("index.html").exists());
}

#[test]
fn rerun_against_existing_report_dir_succeeds() {
    let ws = Workspace::new();
    ws.command("report").assert().success();
    // Directory creation is idempotent; the second run overwrites artifacts.
    ws.command("report").assert().success();
    assert!(ws.report_dir().join("index.html").is_file());
}

#[test]
fn plan_prints_the_order_and_runs_nothing() {
    let ws = Workspace::new();
    let output = ws.command("plan").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Report directory: output/val_session_01"));
    let setup = stdout.find("setup").unwrap();
    let topic = stdout.find("validate topics").unwrap();
    let top = stdout.find("render top-level report").unwrap();
    assert!(setup < topic && topic < top);

    assert!(
        !ws.dir.path().join("output").exists(),
        "plan must not create the report directory"
    );
}

#[test]
fn tracking_store_accumulates_and_updates() {
    let ws = Workspace::new();
    let store = ws.dir.path().join("report_store");

    let run = |ws: &Workspace| {
        ws.command("report")
            .arg("--report-store-dir")
            .arg(&store)
            .arg("--relpath-from-report-store-dir")
            .assert()
            .success();
    };
    run(&ws);
    run(&ws);

    let store_file = store.join("response_time_tracking.json");
    let text = fs::read_to_string(&store_file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entries = parsed["entries"].as_array().unwrap();
    // Same trace twice: updated in place, not appended.
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["run"], "val_session_01");
    assert_eq!(entries[0]["paths"][0]["path_name"], "main_path");
    assert_eq!(entries[0]["paths"][0]["best_avg"], 12.5);
    assert!(entries[0]["paths"][1]["best_avg"].is_null());

    let link = entries[0]["report_path"].as_str().unwrap();
    assert!(
        !Path::new(link).is_absolute(),
        "relpath option must record store-relative links, got {link}"
    );
}

#[test]
fn options_are_read_from_the_environment() {
    let ws = Workspace::new();
    let mut cmd = Command::cargo_bin("traceval").unwrap();
    cmd.current_dir(ws.dir.path())
        .arg("report")
        .env("trace_data", &ws.trace)
        .env("component_list_json", &ws.component)
        .env("target_path_json", &ws.target)
        .env("tool_dir", &ws.tools);
    cmd.assert().success();
    assert!(ws.report_dir().join("index.html").is_file());
}

#[test]
fn missing_trace_directory_fails_fast() {
    let ws = Workspace::new();
    let mut cmd = Command::cargo_bin("traceval").unwrap();
    cmd.current_dir(ws.dir.path())
        .arg("report")
        .arg("--trace-data")
        .arg("/no/such/trace")
        .arg("--component-list-json")
        .arg(&ws.component)
        .arg("--target-path-json")
        .arg(&ws.target)
        .arg("--tool-dir")
        .arg(&ws.tools);

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing trace data directory"), "{stderr}");
    assert!(
        !ws.dir.path().join("output").exists(),
        "nothing may run with a broken configuration"
    );
}

#[test]
fn missing_tool_aborts_before_later_stages() {
    let ws = Workspace::new();
    fs::remove_file(ws.tools.join("trace-failure-summary")).unwrap();

    let output = ws.command("report").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("trace-failure-summary"), "{stderr}");

    let report = ws.report_dir();
    // The failure summary and everything after it never ran.
    assert!(!report.join("trace_failure.html").exists());
    assert!(!report.join("index.html").exists());
}
