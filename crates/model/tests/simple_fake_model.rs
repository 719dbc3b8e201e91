use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;

use toolwright_model::{
    AssistantMessage, ErrorKind, ModelFinishReason, ModelMessage,
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ToolCallRequest,
};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message, and asks for the `echo` tool whenever the
/// message starts with `!`.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let Some(last) = req.messages.last() else {
                break 'blk Err(FakeModelProviderError(ErrorKind::Other));
            };
            let ModelMessage::User { content } = last else {
                break 'blk Err(FakeModelProviderError(
                    ErrorKind::InvalidResponse,
                ));
            };

            if let Some(rest) = content.strip_prefix('!') {
                let arguments =
                    serde_json::json!({ "text": rest }).to_string();
                break 'blk Ok(ModelResponse {
                    message: AssistantMessage {
                        content: String::new(),
                        tool_calls: vec![ToolCallRequest::new(
                            "call:0", "echo", arguments,
                        )],
                    },
                    finish_reason: Some(ModelFinishReason::ToolCalls),
                });
            }

            Ok(ModelResponse {
                message: AssistantMessage::text(format!("You said {content}")),
                finish_reason: Some(ModelFinishReason::Stop),
            })
        };
        ready(result)
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![ModelMessage::user("Good morning")],
            tools: vec![],
        };
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.message.content, "You said Good morning");
        assert!(resp.message.tool_calls.is_empty());
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
    }

    #[tokio::test]
    async fn test_tool_call() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![
                ModelMessage::system("Be brief."),
                ModelMessage::user("!ping"),
            ],
            tools: vec![],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let call = &resp.message.tool_calls[0];
        assert_eq!(call.name, "echo");
        assert_eq!(call.arguments, r#"{"text":"ping"}"#);
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![],
            tools: vec![],
        };
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_message_serialization() {
        let msg = ModelMessage::Assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest::new("1", "add", "{}")],
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["tool_calls"][0]["name"], "add");

        let back: ModelMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
