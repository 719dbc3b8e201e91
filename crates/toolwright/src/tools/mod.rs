//! Mock enterprise tools for trying the loops out.
//!
//! Every tool answers with canned data instead of calling a real service.

mod prediction;
mod report;
mod simulation;
mod statistics;

use toolwright_core::tool::Registry;

pub use prediction::RunDlPredictionTool;
pub use report::query_bi_report;
pub use simulation::TriggerSimulationTool;
pub use statistics::QueryDataStatisticsTool;

/// Creates a registry holding every built-in tool.
pub fn default_registry() -> Registry {
    Registry::new()
        .with_tool(QueryDataStatisticsTool::new())
        .with_tool(RunDlPredictionTool::new())
        .with_tool(TriggerSimulationTool::new())
        .with_spec(query_bi_report())
}
