use serde::{Deserialize, Serialize};

use crate::request::AssistantMessage;

/// A completely received response from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The assistant message, normalized from the backend's wire format.
    pub message: AssistantMessage,
    /// The reason the model finished generating, if the backend reported
    /// one.
    pub finish_reason: Option<ModelFinishReason>,
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model needs to call a tool.
    ToolCalls,
    /// The model has finished generating text.
    Stop,
    /// The output was cut by the token limit.
    Length,
}

impl ModelFinishReason {
    /// Maps a backend finish reason string (`finish_reason` or
    /// `done_reason`) to a known reason.
    pub fn from_wire(reason: &str) -> Option<Self> {
        match reason {
            "tool_calls" | "function_call" => Some(Self::ToolCalls),
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            _ => None,
        }
    }
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request, assigned by the
    /// backend or synthesized by the adapter.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The arguments, as a JSON-encoded string that is expected to hold an
    /// object.
    ///
    /// The string is kept as the model produced it, so that consumers can
    /// run their own repair strategy before decoding it.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Creates a tool call request.
    #[inline]
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}
