//! Explicit stage dependency graph.
//!
//! Stages are nodes; an edge runs from the producer of an artifact to each of
//! its consumers. Validation rejects missing producers, duplicate producers
//! and cycles before anything executes, so a broken wiring fails up front
//! instead of mid-pipeline.

use super::artifact::ArtifactId;
use super::stage::Stage;
use crate::errors::{PipelineError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};

/// The pipeline's stages plus the artifacts configuration supplies up front.
pub struct StageGraph {
    stages: Vec<Box<dyn Stage>>,
    sources: BTreeSet<ArtifactId>,
}

impl StageGraph {
    pub fn new(stages: Vec<Box<dyn Stage>>, sources: impl IntoIterator<Item = ArtifactId>) -> Self {
        Self {
            stages,
            sources: sources.into_iter().collect(),
        }
    }

    pub fn stage(&self, index: usize) -> &dyn Stage {
        self.stages[index].as_ref()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Validate the hand-off contract and return the execution order.
    ///
    /// Every problem is reported, not just the first. The order is a
    /// deterministic topological sort: among ready stages, the one declared
    /// first runs first, so a stage list that is already in dependency order
    /// executes exactly as listed.
    pub fn execution_order(&self) -> Result<Vec<usize>> {
        let mut problems = Vec::new();
        let mut producer: BTreeMap<ArtifactId, usize> = BTreeMap::new();

        for (index, stage) in self.stages.iter().enumerate() {
            for &output in stage.outputs() {
                if self.sources.contains(&output) {
                    problems.push(format!(
                        "stage '{}' produces '{}', which is supplied by configuration",
                        stage.name(),
                        output.label()
                    ));
                    continue;
                }
                if let Some(&previous) = producer.get(&output) {
                    problems.push(format!(
                        "artifact '{}' has two producers: '{}' and '{}'",
                        output.label(),
                        self.stages[previous].name(),
                        stage.name()
                    ));
                } else {
                    producer.insert(output, index);
                }
            }
        }

        let mut graph: DiGraph<usize, ArtifactId> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.stages.len()).map(|i| graph.add_node(i)).collect();

        for (index, stage) in self.stages.iter().enumerate() {
            for &input in stage.inputs() {
                if self.sources.contains(&input) {
                    continue;
                }
                match producer.get(&input) {
                    Some(&from) => {
                        graph.add_edge(nodes[from], nodes[index], input);
                    }
                    None => problems.push(format!(
                        "no stage produces '{}', required by '{}'",
                        input.label(),
                        stage.name()
                    )),
                }
            }
        }

        if !problems.is_empty() {
            return Err(PipelineError::Graph(problems.join("; ")));
        }

        // Kahn's algorithm with an index-ordered ready set for determinism.
        let mut indegree: Vec<usize> = nodes
            .iter()
            .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.stages.len());

        while let Some(&index) = ready.iter().next() {
            ready.remove(&index);
            order.push(index);
            for next in graph.neighbors_directed(nodes[index], Direction::Outgoing) {
                let i = graph[next];
                indegree[i] -= 1;
                if indegree[i] == 0 {
                    ready.insert(i);
                }
            }
        }

        if order.len() != self.stages.len() {
            let stuck: Vec<&str> = (0..self.stages.len())
                .filter(|i| !order.contains(i))
                .map(|i| self.stages[i].name())
                .collect();
            return Err(PipelineError::Graph(format!(
                "dependency cycle involving: {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }
}
