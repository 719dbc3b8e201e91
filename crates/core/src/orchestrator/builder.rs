use std::sync::Arc;

use toolwright_model::ModelProvider;

use super::Orchestrator;
use crate::model_client::ModelClient;
use crate::tool::Registry;
use crate::trace::{NoopTraceSink, TraceSink};

/// The instructions used when none are given.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an orchestration assistant \
     for enterprise internal tools. Prefer the available tools for \
     statistics, prediction and simulation requests. When a tool is needed, \
     reply with a standard function call only.";

/// [`Orchestrator`] builder.
pub struct OrchestratorBuilder {
    model_client: ModelClient,
    registry: Arc<Registry>,
    trace_sink: Arc<dyn TraceSink>,
    system_prompt: String,
    max_steps: usize,
    channel: String,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Arc::new(Registry::new()),
            trace_sink: Arc::new(NoopTraceSink),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            max_steps: 3,
            channel: "orchestrator".to_owned(),
        }
    }

    /// Sets the tools offered to the model.
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

    /// Replaces the system instructions.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the maximum number of model round trips per run.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the channel name recorded in trace events.
    #[inline]
    pub fn with_channel<S: Into<String>>(mut self, channel: S) -> Self {
        self.channel = channel.into();
        self
    }

    /// Builds the orchestrator.
    #[inline]
    pub fn build(self) -> Orchestrator {
        let Self {
            model_client,
            registry,
            trace_sink,
            system_prompt,
            max_steps,
            channel,
        } = self;
        Orchestrator {
            model_client,
            registry,
            trace_sink,
            system_prompt,
            max_steps,
            channel,
        }
    }
}
