use serde::{Deserialize, Serialize};
use toolwright_model::{
    AssistantMessage, ModelFinishReason, ModelResponse, ToolCallRequest,
};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a text-only `PresetResponse`.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(content.into())])
    }

    /// Creates a `PresetResponse` requesting a single tool call.
    #[inline]
    pub fn tool_call<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self::with_events([PresetEvent::ToolCall(ToolCallRequest::new(
            id, name, arguments,
        ))])
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Assembles the events into a complete response.
    pub fn to_response(&self) -> ModelResponse {
        let mut message = AssistantMessage::default();
        for event in &self.events {
            match event {
                PresetEvent::MessageDelta(delta) => {
                    message.content.push_str(delta)
                }
                PresetEvent::ToolCall(req) => {
                    message.tool_calls.push(req.clone())
                }
            }
        }
        let finish_reason = if message.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };
        ModelResponse {
            message,
            finish_reason: Some(finish_reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta(
                "I have left a message for you.".to_string(),
            ),
            PresetEvent::ToolCall(ToolCallRequest::new(
                "1",
                "write_file",
                r#"{"filename": "message.txt", "content": "Hello, world!"}"#,
            )),
        ])
        .with_failures(2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_to_response() {
        let resp = PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, ".to_owned()),
            PresetEvent::MessageDelta("let me look.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest::new("1", "ls", "{}")),
        ])
        .to_response();
        assert_eq!(resp.message.content, "Sure, let me look.");
        assert_eq!(resp.message.tool_calls.len(), 1);
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));

        let resp = PresetResponse::text("done").to_response();
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
    }
}
