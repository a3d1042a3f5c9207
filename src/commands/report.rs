//! The `report` subcommand: run the whole pipeline for one trace.

use crate::config::RunConfig;
use crate::errors::Result;
use crate::pipeline::{ArtifactPaths, Driver, RunContext, StageGraph};
use crate::stages;
use colored::Colorize;

pub fn handle_report(config: RunConfig) -> Result<()> {
    config.validate()?;

    let paths = ArtifactPaths::resolve(&config);
    let graph = StageGraph::new(
        stages::build_stages(&config, &paths),
        stages::source_artifacts(&config),
    );
    let ctx = RunContext {
        config: &config,
        paths: &paths,
    };

    let timings = Driver::new(graph).run(&ctx)?;
    for timing in &timings {
        log::debug!("{}", timing.format());
    }

    // The one success banner of a run.
    println!(
        "{}",
        format!("Trace report generated: {}", config.report_dir().display())
            .green()
            .bold()
    );
    Ok(())
}
