use std::fmt::Debug;
use std::time::Duration;

/// Builder for [`OllamaConfig`].
#[derive(Clone, Default, PartialEq)]
pub struct OllamaConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    timeout: Option<Duration>,
}

impl OllamaConfigBuilder {
    /// Creates a builder with every option left to its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    ///
    /// A local Ollama server needs none; the key is only sent when set, for
    /// servers sitting behind an authenticating proxy.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the timeout of a single request.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OllamaConfig {
        OllamaConfig {
            api_key: self.api_key.filter(|key| !key.is_empty()),
            model: self.model.unwrap_or_else(|| "qwen2.5:14b".to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
            temperature: self.temperature.unwrap_or(0.1),
            timeout: self.timeout.unwrap_or(Duration::from_secs(45)),
        }
    }
}

impl Debug for OllamaConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for the Ollama provider.
#[derive(Clone, PartialEq)]
pub struct OllamaConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) temperature: f32,
    pub(crate) timeout: Duration,
}

impl OllamaConfig {
    /// Returns the native chat endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

impl Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}
