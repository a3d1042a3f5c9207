//! The `plan` subcommand: validate the stage graph and show what a run
//! would execute, without invoking anything.

use crate::config::RunConfig;
use crate::errors::Result;
use crate::pipeline::{ArtifactId, ArtifactPaths, StageGraph};
use crate::stages;

pub fn handle_plan(config: RunConfig) -> Result<()> {
    config.validate()?;

    let paths = ArtifactPaths::resolve(&config);
    let graph = StageGraph::new(
        stages::build_stages(&config, &paths),
        stages::source_artifacts(&config),
    );
    let order = graph.execution_order()?;

    println!("Report directory: {}", config.report_dir().display());
    println!("Stages ({}):", order.len());
    for (i, index) in order.into_iter().enumerate() {
        let stage = graph.stage(index);
        println!("{:3}. {}", i + 1, stage.name());
        println!("       reads:  {}", labels(stage.inputs()));
        println!("       writes: {}", labels(stage.outputs()));
    }
    Ok(())
}

fn labels(artifacts: &[ArtifactId]) -> String {
    if artifacts.is_empty() {
        return "-".to_string();
    }
    artifacts
        .iter()
        .map(|id| id.label())
        .collect::<Vec<_>>()
        .join(", ")
}
