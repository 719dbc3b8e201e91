use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::BaseDirs;

/// The wire dialect spoken by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// An OpenAI-compatible server, such as vLLM.
    Vllm,
    /// An Ollama server, using its native chat API.
    Ollama,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vllm" => Ok(Backend::Vllm),
            "ollama" => Ok(Backend::Ollama),
            _ => Err(()),
        }
    }
}

/// Which tool-calling loop drives the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Structured function calls, one fresh conversation per query.
    Orchestrator,
    /// Tag-delimited calls in free text, one conversation for the session.
    Intranet,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "orchestrator" => Ok(Mode::Orchestrator),
            "intranet" => Ok(Mode::Intranet),
            _ => Err(()),
        }
    }
}

/// Deployment settings, read from `TOOLWRIGHT_*` environment variables.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// The backend dialect.
    pub backend: Backend,
    /// The backend base URL.
    pub base_url: String,
    /// The bearer token sent to the backend.
    pub api_key: String,
    /// The model name.
    pub model: String,
    /// The timeout of a single backend request.
    pub request_timeout: Duration,
    /// The maximum number of model round trips per query.
    pub max_loop_steps: usize,
    /// The sampling temperature.
    pub temperature: f32,
    /// The loop variant.
    pub mode: Mode,
    /// Where trace events are appended.
    pub trace_path: PathBuf,
    /// Where the intranet loop logs the conversation, if anywhere.
    pub memory_path: Option<PathBuf>,
    /// Serve the orchestrator over HTTP on this address instead of
    /// starting the terminal front end.
    pub serve_addr: Option<SocketAddr>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Vllm,
            base_url: "http://127.0.0.1:8000".to_owned(),
            api_key: "sk-internal".to_owned(),
            model: "qwen2.5-32b-instruct".to_owned(),
            request_timeout: Duration::from_secs(45),
            max_loop_steps: 3,
            temperature: 0.1,
            mode: Mode::Orchestrator,
            trace_path: default_trace_path(),
            memory_path: None,
            serve_addr: None,
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// Unset variables take their defaults, and so do invalid ones after a
    /// warning is logged.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = parse_or(
            &lookup,
            "TOOLWRIGHT_REQUEST_TIMEOUT_S",
            defaults.request_timeout.as_secs_f64(),
        );
        let request_timeout = match Duration::try_from_secs_f64(timeout_secs)
        {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => {
                warn!("ignoring invalid request timeout: {timeout_secs}");
                defaults.request_timeout
            }
        };
        let max_loop_steps = match parse_or(
            &lookup,
            "TOOLWRIGHT_MAX_LOOP_STEPS",
            defaults.max_loop_steps,
        ) {
            0 => {
                warn!("ignoring a step budget of zero");
                defaults.max_loop_steps
            }
            steps => steps,
        };

        Self {
            backend: parse_or(&lookup, "TOOLWRIGHT_LLM_BACKEND", defaults.backend),
            base_url: lookup("TOOLWRIGHT_LLM_BASE_URL")
                .unwrap_or(defaults.base_url),
            api_key: lookup("TOOLWRIGHT_LLM_API_KEY")
                .unwrap_or(defaults.api_key),
            model: lookup("TOOLWRIGHT_LLM_MODEL").unwrap_or(defaults.model),
            request_timeout,
            max_loop_steps,
            temperature: parse_or(
                &lookup,
                "TOOLWRIGHT_TEMPERATURE",
                defaults.temperature,
            ),
            mode: parse_or(&lookup, "TOOLWRIGHT_MODE", defaults.mode),
            trace_path: lookup("TOOLWRIGHT_TRACE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.trace_path),
            memory_path: lookup("TOOLWRIGHT_MEMORY_PATH").map(PathBuf::from),
            serve_addr: lookup("TOOLWRIGHT_SERVE_ADDR").and_then(|raw| {
                match raw.trim().parse() {
                    Ok(addr) => Some(addr),
                    Err(_) => {
                        warn!("ignoring invalid serve address: {raw:?}");
                        None
                    }
                }
            }),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("max_loop_steps", &self.max_loop_steps)
            .field("temperature", &self.temperature)
            .field("mode", &self.mode)
            .field("trace_path", &self.trace_path)
            .field("memory_path", &self.memory_path)
            .field("serve_addr", &self.serve_addr)
            .finish()
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("ignoring invalid value of {key}: {raw:?}");
            default
        }
    }
}

fn default_trace_path() -> PathBuf {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".toolwright").join("logs").join("tool_trace.jsonl")
}
