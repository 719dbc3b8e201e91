use std::sync::Arc;

use toolwright_core::memory::TextMemory;
use toolwright_core::tool::Registry;
use toolwright_core::trace::TraceSink;
use toolwright_core::{
    Error, IntranetAgent, IntranetAgentBuilder, Orchestrator,
    OrchestratorBuilder, RunOutcome,
};
use toolwright_model::ModelProvider;
use toolwright_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use toolwright_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

use crate::settings::{Backend, Mode, Settings};
use crate::tools::default_registry;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    settings: Settings,
    registry: Option<Registry>,
    trace_sink: Option<Arc<dyn TraceSink>>,
    session_id: String,
}

impl SessionBuilder {
    /// Creates a session builder from deployment settings.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            registry: None,
            trace_sink: None,
            session_id: "default".to_owned(),
        }
    }

    /// Replaces the built-in tools.
    #[inline]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets where trace events go.
    #[inline]
    pub fn with_trace_sink(mut self, trace_sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(trace_sink);
        self
    }

    /// Sets the session key recorded in traces and outcomes.
    #[inline]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Builds a session talking to the configured backend.
    pub fn build(self) -> Session {
        match self.settings.backend {
            Backend::Vllm => {
                let provider = openai_provider(&self.settings);
                self.build_with_provider(provider)
            }
            Backend::Ollama => {
                let provider = ollama_provider(&self.settings);
                self.build_with_provider(provider)
            }
        }
    }

    /// Builds a bare orchestrator talking to the configured backend,
    /// regardless of the configured mode.
    ///
    /// Unlike a [`Session`], the orchestrator can serve concurrent runs.
    pub fn build_orchestrator(self) -> Orchestrator {
        match self.settings.backend {
            Backend::Vllm => {
                let provider = openai_provider(&self.settings);
                self.build_orchestrator_with_provider(provider)
            }
            Backend::Ollama => {
                let provider = ollama_provider(&self.settings);
                self.build_orchestrator_with_provider(provider)
            }
        }
    }

    /// Builds a bare orchestrator with the specified model provider.
    pub fn build_orchestrator_with_provider<P: ModelProvider + 'static>(
        self,
        provider: P,
    ) -> Orchestrator {
        let mut builder = OrchestratorBuilder::with_model_provider(provider)
            .with_registry(self.registry.unwrap_or_else(default_registry))
            .with_max_steps(self.settings.max_loop_steps);
        if let Some(trace_sink) = self.trace_sink {
            builder = builder.with_trace_sink(trace_sink);
        }
        builder.build()
    }

    /// Builds a session with the specified model provider instead of the
    /// configured backend.
    pub fn build_with_provider<P: ModelProvider + 'static>(
        self,
        provider: P,
    ) -> Session {
        let Self {
            settings,
            registry,
            trace_sink,
            session_id,
        } = self;
        let registry = registry.unwrap_or_else(default_registry);
        let max_steps = settings.max_loop_steps;

        let inner = match settings.mode {
            Mode::Orchestrator => {
                let mut builder =
                    OrchestratorBuilder::with_model_provider(provider)
                        .with_registry(registry)
                        .with_max_steps(max_steps);
                if let Some(trace_sink) = trace_sink {
                    builder = builder.with_trace_sink(trace_sink);
                }
                Inner::Orchestrator(builder.build())
            }
            Mode::Intranet => {
                let mut builder =
                    IntranetAgentBuilder::with_model_provider(provider)
                        .with_registry(registry)
                        .with_session_id(session_id.clone())
                        .with_max_steps(max_steps);
                if let Some(trace_sink) = trace_sink {
                    builder = builder.with_trace_sink(trace_sink);
                }
                if let Some(path) = settings.memory_path {
                    builder = builder.with_memory(TextMemory::new(path));
                }
                Inner::Intranet(Box::new(builder.build()))
            }
        };
        Session { inner, session_id }
    }
}

fn openai_provider(settings: &Settings) -> OpenAIProvider {
    let config = OpenAIConfigBuilder::with_api_key(settings.api_key.clone())
        .with_base_url(settings.base_url.clone())
        .with_model(settings.model.clone())
        .with_temperature(settings.temperature)
        .with_timeout(settings.request_timeout)
        .build();
    OpenAIProvider::new(config)
}

fn ollama_provider(settings: &Settings) -> OllamaProvider {
    let config = OllamaConfigBuilder::new()
        .with_api_key(settings.api_key.clone())
        .with_base_url(settings.base_url.clone())
        .with_model(settings.model.clone())
        .with_temperature(settings.temperature)
        .with_timeout(settings.request_timeout)
        .build();
    OllamaProvider::new(config)
}

enum Inner {
    Orchestrator(Orchestrator),
    Intranet(Box<IntranetAgent>),
}

/// A chat session driving one of the tool-calling loops.
///
/// In orchestrator mode every query starts over, while the intranet loop
/// remembers the earlier turns of the session.
pub struct Session {
    inner: Inner,
    session_id: String,
}

impl Session {
    /// Returns the session key.
    #[inline]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Answers a user query.
    pub async fn send_message(
        &mut self,
        query: &str,
    ) -> Result<RunOutcome, Error> {
        match &mut self.inner {
            Inner::Orchestrator(orchestrator) => {
                orchestrator.run(query, &self.session_id).await
            }
            Inner::Intranet(agent) => agent.chat(query).await,
        }
    }
}
