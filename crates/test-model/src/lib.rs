//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::sleep;
use toolwright_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct State {
    attempts: Vec<u64>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// number of assistant messages already in the request, so a tool-calling
/// loop walks the script one step per round trip. If there are not enough
/// steps in the script, an error will be returned, unless the provider is
/// set to repeat its last step.
///
/// Clones share the recorded requests and failure counters.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<PresetResponse>,
    repeat_last: bool,
    delay: Option<Duration>,
    state: Arc<Mutex<State>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script.push(preset);
    }

    /// Builder-style variant of
    /// [`add_assistant_response_step`](Self::add_assistant_response_step).
    #[inline]
    pub fn with_step(mut self, preset: PresetResponse) -> Self {
        self.add_assistant_response_step(preset);
        self
    }

    /// Keeps serving the last step once the script is exhausted.
    #[inline]
    pub fn set_repeat_last(&mut self, repeat_last: bool) {
        self.repeat_last = repeat_last;
    }

    /// Delays every response by `duration`.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }

    fn respond(&self, req: &ModelRequest) -> Result<ModelResponse, Error> {
        let mut state =
            self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(req.clone());

        let step_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::Assistant(_)))
            .count();
        let step_idx = if self.repeat_last {
            step_idx.min(self.conversation_script.len().saturating_sub(1))
        } else {
            step_idx
        };
        let Some(preset) = self.conversation_script.get(step_idx) else {
            return Err(Error {
                message: "not enough steps",
                kind: ErrorKind::Other,
            });
        };

        if let Some(failures) = preset.failures {
            if state.attempts.len() <= step_idx {
                state.attempts.resize(step_idx + 1, 0);
            }
            let attempts = &mut state.attempts[step_idx];
            *attempts += 1;
            if failures == 0 || *attempts <= failures {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::Http,
                });
            }
        }

        Ok(preset.to_response())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = self.respond(req);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}
