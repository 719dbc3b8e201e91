use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use toolwright_core::tool::{Tool, ToolResult};

#[derive(Deserialize, JsonSchema)]
pub struct RunDlPredictionParameters {
    #[schemars(description = "The name of the deployed model.")]
    model_name: String,
    #[schemars(description = "Inputs passed to the model as they are.")]
    parameters: Map<String, Value>,
}

/// A tool for running inference on the internal deep learning service.
pub struct RunDlPredictionTool {
    parameter_schema: Value,
}

impl RunDlPredictionTool {
    /// Creates a new prediction tool.
    #[inline]
    pub fn new() -> Self {
        RunDlPredictionTool {
            parameter_schema: schema_for!(RunDlPredictionParameters).to_value(),
        }
    }
}

impl Default for RunDlPredictionTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RunDlPredictionTool {
    type Input = RunDlPredictionParameters;

    fn name(&self) -> &str {
        "run_dl_prediction"
    }

    fn description(&self) -> &str {
        "Calls the internal deep learning inference service and returns the \
         prediction."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: RunDlPredictionParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            Ok(json!({
                "status": "success",
                "source": "mock-dl-service",
                "model_name": input.model_name,
                "parameters": input.parameters,
                "prediction": "next_week_sales:+15%",
                "confidence": 0.89,
            }))
        }
    }
}
