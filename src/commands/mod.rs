//! Subcommand handlers.

pub mod plan;
pub mod report;
