use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};
use toolwright_core::tool::{Error as ToolError, Tool, ToolResult};

#[derive(Deserialize, JsonSchema)]
pub struct TriggerSimulationParameters {
    #[schemars(description = "The simulation environment.")]
    #[serde(default = "default_sim_env")]
    sim_env: String,
    #[schemars(description = "The number of steps to simulate.")]
    #[schemars(range(min = 1))]
    #[serde(default = "default_steps")]
    steps: u64,
}

fn default_sim_env() -> String {
    "default".to_owned()
}

fn default_steps() -> u64 {
    100
}

/// A tool for starting jobs on the internal simulation service.
pub struct TriggerSimulationTool {
    parameter_schema: Value,
}

impl TriggerSimulationTool {
    /// Creates a new simulation tool.
    #[inline]
    pub fn new() -> Self {
        TriggerSimulationTool {
            parameter_schema: schema_for!(TriggerSimulationParameters)
                .to_value(),
        }
    }
}

impl Default for TriggerSimulationTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for TriggerSimulationTool {
    type Input = TriggerSimulationParameters;

    fn name(&self) -> &str {
        "trigger_simulation"
    }

    fn description(&self) -> &str {
        "Starts a job on the internal simulation service and returns its id."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: TriggerSimulationParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            if input.steps == 0 {
                return Err(ToolError::invalid_input()
                    .with_reason("`steps` must be at least 1"));
            }
            Ok(json!({
                "status": "running",
                "source": "mock-simulation-service",
                "job_id": "SIM-9982",
                "sim_env": input.sim_env,
                "steps": input.steps,
                "message": "simulation job started",
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_input_validation() {
        let tool = TriggerSimulationTool::new();

        let input: TriggerSimulationParameters =
            serde_json::from_value(json!({})).unwrap();
        let result = tool.execute(input).await.unwrap();
        assert_eq!(result["sim_env"], "default");
        assert_eq!(result["steps"], 100);
        assert_eq!(result["job_id"], "SIM-9982");

        let input: TriggerSimulationParameters =
            serde_json::from_value(json!({ "steps": 0 })).unwrap();
        assert!(tool.execute(input).await.is_err());
    }
}
