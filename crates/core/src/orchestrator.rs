mod builder;

use std::sync::Arc;

use serde_json::Value;
use toolwright_model::{
    ModelMessage, ModelRequest, ToolCallRequest, ToolCallResult,
};
use toolwright_repair::repair_object;
use tracing::Instrument;

use crate::error::Error;
use crate::model_client::ModelClient;
use crate::outcome::{RunOutcome, ToolTrace};
use crate::tool::Registry;
use crate::trace::{TraceEvent, TraceSink};
pub use builder::{DEFAULT_SYSTEM_PROMPT, OrchestratorBuilder};

/// The answer of a run that used up its step budget.
pub const STEP_LIMIT_ANSWER: &str =
    "the orchestrator exceeded its step budget; simplify or split the request";

/// A bounded tool-calling loop over structured function calls.
///
/// Each run starts a fresh conversation, so one orchestrator can serve
/// concurrent runs. The registry and trace sink are shared between them.
pub struct Orchestrator {
    model_client: ModelClient,
    registry: Arc<Registry>,
    trace_sink: Arc<dyn TraceSink>,
    system_prompt: String,
    max_steps: usize,
    channel: String,
}

impl Orchestrator {
    /// Returns the tool registry.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Answers `query`, calling tools until the model replies without tool
    /// calls or the step budget runs out.
    ///
    /// Running out of steps is not an error, it yields an outcome with the
    /// [`Error`](crate::RunStatus::Error) status and the partial trace.
    /// Only a failed backend request aborts the run.
    pub async fn run(
        &self,
        query: &str,
        session_id: &str,
    ) -> Result<RunOutcome, Error> {
        let span = debug_span!("orchestrator run", session_id);
        self.run_inner(query, session_id).instrument(span).await
    }

    async fn run_inner(
        &self,
        query: &str,
        session_id: &str,
    ) -> Result<RunOutcome, Error> {
        let mut messages = vec![
            ModelMessage::system(self.system_prompt.clone()),
            ModelMessage::user(query),
        ];
        let tools = self.registry.schemas();
        let mut trace = vec![];

        for step in 0..self.max_steps {
            debug!("step {}/{}", step + 1, self.max_steps);
            let resp = self
                .model_client
                .send_request(ModelRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                })
                .await
                .map_err(Error::model)?;

            let assistant = resp.message;
            messages.push(ModelMessage::Assistant(assistant.clone()));
            if assistant.tool_calls.is_empty() {
                debug!("got the final answer");
                return Ok(RunOutcome::success(
                    session_id,
                    assistant.content,
                    trace,
                ));
            }

            for call in assistant.tool_calls {
                let ToolCallRequest {
                    id,
                    name,
                    arguments,
                } = call;
                let (arguments, result) =
                    self.call_tool(&name, arguments).await;

                self.trace_sink.append(
                    TraceEvent::new("tool_call")
                        .with("channel", self.channel.as_str())
                        .with("session_key", session_id)
                        .with("tool", name.as_str())
                        .with("arguments", arguments.clone())
                        .with("result", result.as_str()),
                );
                messages.push(ModelMessage::Tool(ToolCallResult {
                    id,
                    name: Some(name.clone()),
                    content: result.clone(),
                }));
                trace.push(ToolTrace {
                    tool: name,
                    arguments,
                    result,
                });
            }
        }

        warn!("step budget of {} exhausted", self.max_steps);
        Ok(RunOutcome::step_limit(session_id, STEP_LIMIT_ANSWER, trace))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: String,
    ) -> (Value, String) {
        match repair_object(&arguments) {
            Ok(arguments) => {
                let result =
                    self.registry.execute(name, arguments.clone()).await;
                (Value::Object(arguments), result)
            }
            Err(err) => {
                warn!("invalid arguments for `{name}`: {err}");
                (
                    Value::String(arguments),
                    format!("invalid tool arguments: {err}"),
                )
            }
        }
    }
}
