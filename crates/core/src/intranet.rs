mod builder;
mod extract;

use std::sync::Arc;

use serde_json::Value;
use toolwright_model::{AssistantMessage, ModelMessage, ModelRequest};
use toolwright_repair::{Object, repair_object};
use tracing::Instrument;

use crate::error::Error;
use crate::memory::TextMemory;
use crate::model_client::ModelClient;
use crate::outcome::{RunOutcome, ToolTrace};
use crate::tool::Registry;
use crate::trace::{TraceEvent, TraceSink};
pub use builder::{IntranetAgentBuilder, system_prompt};
pub use extract::extract_tool_call;

/// The answer of a chat turn that used up its step budget.
pub const ROUND_LIMIT_ANSWER: &str = "tool call rounds exceeded the limit";

/// A tool-calling loop for models without native function calling.
///
/// Tools are listed in the system prompt, and the model is told to wrap a
/// single call in `<tool_call>` tags inside its reply. Observations are
/// sent back as user messages wrapped in `<tool_result>` tags.
///
/// Unlike [`Orchestrator`](crate::Orchestrator), the agent keeps its
/// conversation across [`chat`](Self::chat) calls.
pub struct IntranetAgent {
    model_client: ModelClient,
    registry: Arc<Registry>,
    trace_sink: Arc<dyn TraceSink>,
    memory: Option<TextMemory>,
    messages: Vec<ModelMessage>,
    session_id: String,
    max_steps: usize,
}

impl IntranetAgent {
    /// Returns the conversation so far, starting with the system prompt.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Handles one user input.
    ///
    /// The reply text is the final answer as soon as it carries no tool
    /// call tag. Running out of steps yields an outcome with the
    /// [`Error`](crate::RunStatus::Error) status.
    pub async fn chat(&mut self, input: &str) -> Result<RunOutcome, Error> {
        let span = debug_span!(
            "intranet chat",
            session_id = self.session_id.as_str()
        );
        self.chat_inner(input).instrument(span).await
    }

    async fn chat_inner(&mut self, input: &str) -> Result<RunOutcome, Error> {
        if let Some(memory) = &self.memory {
            memory.append("user", input)?;
        }
        self.messages.push(ModelMessage::user(input));
        let mut trace = vec![];

        for step in 0..self.max_steps {
            debug!("step {}/{}", step + 1, self.max_steps);
            let resp = self
                .model_client
                .send_request(ModelRequest {
                    messages: self.messages.clone(),
                    tools: vec![],
                })
                .await
                .map_err(Error::model)?;

            // Structured calls are ignored here, only the tags count.
            let content = resp.message.content;
            self.messages
                .push(ModelMessage::Assistant(AssistantMessage::text(&content)));

            let Some(payload) = extract_tool_call(&content) else {
                if let Some(memory) = &self.memory {
                    memory.append("assistant", &content)?;
                }
                return Ok(RunOutcome::success(
                    &self.session_id,
                    content,
                    trace,
                ));
            };

            let (tool, arguments, result) = self.call_tool(payload).await;
            self.trace_sink.append(
                TraceEvent::new("tool_call")
                    .with("channel", "intranet")
                    .with("session_key", self.session_id.as_str())
                    .with("tool", tool.as_str())
                    .with("arguments", arguments.clone())
                    .with("result", result.as_str()),
            );
            self.messages.push(ModelMessage::user(format!(
                "<tool_result>{result}</tool_result>"
            )));
            trace.push(ToolTrace {
                tool,
                arguments,
                result,
            });
        }

        warn!("round limit of {} exhausted", self.max_steps);
        Ok(RunOutcome::step_limit(
            &self.session_id,
            ROUND_LIMIT_ANSWER,
            trace,
        ))
    }

    /// Decodes a tag payload and runs the tool it names, returning the tool
    /// name, the arguments and the observation.
    async fn call_tool(&self, payload: &str) -> (String, Value, String) {
        let mut call = match repair_object(payload) {
            Ok(call) => call,
            Err(err) => {
                warn!("undecodable tool call payload: {err}");
                return (
                    String::new(),
                    Value::String(payload.to_owned()),
                    format!("tool call payload could not be parsed: {err}"),
                );
            }
        };

        let name = match call.remove("name") {
            Some(Value::String(name)) => name,
            _ => {
                return (
                    String::new(),
                    Value::Object(call),
                    "tool call payload names no tool".to_owned(),
                );
            }
        };
        let arguments = call.remove("args").or_else(|| call.remove("arguments"));
        let arguments = match arguments {
            None => Object::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(other) => {
                return (
                    name,
                    other,
                    "invalid tool arguments: expected an object".to_owned(),
                );
            }
        };

        let result = self.registry.execute(&name, arguments.clone()).await;
        (name, Value::Object(arguments), result)
    }
}
