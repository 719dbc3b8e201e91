use std::sync::Arc;

use toolwright_model::{ModelMessage, ModelProvider};

use super::IntranetAgent;
use crate::memory::TextMemory;
use crate::model_client::ModelClient;
use crate::tool::Registry;
use crate::trace::{NoopTraceSink, TraceSink};

/// Builds the system prompt that teaches the tag protocol for the tools in
/// `registry`.
pub fn system_prompt(registry: &Registry) -> String {
    format!(
        "You are the data assistant of the enterprise digital R&D center.\n\
         You can use these intranet tools:\n\
         {tools}\n\
         \n\
         When you need a tool, you must output exactly:\n\
         <think>your analysis</think>\n\
         <tool_call>{{\"name\": \"tool name\", \"args\": \
         {{\"parameter\": \"value\"}}}}</tool_call>\n\
         \n\
         Once you receive a <tool_result>, give the final answer directly.\n\
         If no tool is needed, answer directly.",
        tools = registry.describe()
    )
}

/// [`IntranetAgent`] builder.
pub struct IntranetAgentBuilder {
    model_client: ModelClient,
    registry: Arc<Registry>,
    trace_sink: Arc<dyn TraceSink>,
    memory: Option<TextMemory>,
    session_id: String,
    max_steps: usize,
}

impl IntranetAgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Arc::new(Registry::new()),
            trace_sink: Arc::new(NoopTraceSink),
            memory: None,
            session_id: "default".to_owned(),
            max_steps: 5,
        }
    }

    /// Sets the tools advertised in the system prompt.
    #[inline]
    pub fn with_registry(
        mut self,
        registry: impl Into<Arc<Registry>>,
    ) -> Self {
        self.registry = registry.into();
        self
    }

    /// Sets where trace events go. Events are dropped by default.
    #[inline]
    pub fn with_trace_sink(mut self, trace_sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = trace_sink;
        self
    }

    /// Logs user inputs and final answers to `memory`.
    #[inline]
    pub fn with_memory(mut self, memory: TextMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Sets the session key recorded in trace events and outcomes.
    #[inline]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Sets the maximum number of model round trips per chat turn.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Builds the agent, rendering the system prompt from the registry.
    pub fn build(self) -> IntranetAgent {
        let Self {
            model_client,
            registry,
            trace_sink,
            memory,
            session_id,
            max_steps,
        } = self;
        let messages = vec![ModelMessage::system(system_prompt(&registry))];
        IntranetAgent {
            model_client,
            registry,
            trace_sink,
            memory,
            messages,
            session_id,
            max_steps,
        }
    }
}
