use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolwright_model::{
    AssistantMessage, ErrorKind, ModelFinishReason, ModelMessage, ModelRequest,
    ModelResponse, ModelTool, ToolCallRequest,
};
use toolwright_repair::{
    REPAIRED_TOOL_CALL_ID, arguments_to_string, tool_call_from_content,
};

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponseToolCall {
    pub id: Option<String>,
    pub function: Option<ResponseFunction>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponseFunction {
    pub name: Option<String>,
    // Should be a JSON-encoded string, but some gateways send an object.
    pub arguments: Option<Value>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionToolCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub r#type: &'static str,
    pub function: FunctionToolCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let tools: Vec<Tool> = req.tools.iter().map(create_tool).collect();
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tool_choice: (!tools.is_empty()).then_some("auto"),
        tools,
        temperature: config.temperature,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System { content } => Message::System {
            content: content.clone(),
        },
        ModelMessage::User { content } => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(assistant) => {
            let tool_calls: Vec<ToolCall> = assistant
                .tool_calls
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    r#type: "function",
                    function: FunctionToolCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect();
            // A tool-call-only turn is sent with a null content.
            let content = if assistant.content.is_empty() && !tool_calls.is_empty()
            {
                None
            } else {
                Some(assistant.content.clone())
            };
            Message::Assistant {
                content,
                tool_calls,
            }
        }
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            name: result.name.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

pub fn parse_response(completion: ChatCompletion) -> Result<ModelResponse, Error> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "response carries no choices",
            ErrorKind::InvalidResponse,
        ));
    };

    let content = choice.message.content.unwrap_or_default();
    let mut tool_calls: Vec<ToolCallRequest> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, call)| {
            let function = call.function;
            ToolCallRequest {
                id: call
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("tool-call-{idx}")),
                name: function
                    .as_ref()
                    .and_then(|f| f.name.clone())
                    .unwrap_or_default(),
                arguments: arguments_to_string(
                    function.and_then(|f| f.arguments),
                ),
            }
        })
        .collect();

    if tool_calls.is_empty() {
        if let Some((name, arguments)) = tool_call_from_content(&content) {
            debug!("recovered tool call `{name}` from text content");
            tool_calls.push(ToolCallRequest::new(
                REPAIRED_TOOL_CALL_ID,
                name,
                Value::Object(arguments).to_string(),
            ));
        }
    }

    Ok(ModelResponse {
        message: AssistantMessage {
            content,
            tool_calls,
        },
        finish_reason: choice
            .finish_reason
            .as_deref()
            .and_then(ModelFinishReason::from_wire),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use toolwright_model::ToolCallResult;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::system("You are a helpful assistant."),
                ModelMessage::user("Hello"),
            ],
            tools: vec![ModelTool {
                name: "shell".to_owned(),
                description: "Runs shell commands.".to_owned(),
                parameters: json!({
                    "type": "string",
                    "description": "The command line."
                }),
            }],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_temperature(0.5)
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "You are a helpful assistant.".to_owned(),
                },
                Message::User {
                    content: "Hello".to_owned(),
                },
            ],
            tools: vec![Tool {
                r#type: "function",
                function: FunctionTool {
                    name: "shell".to_owned(),
                    description: "Runs shell commands.".to_owned(),
                    parameters: json!({
                        "type": "string",
                        "description": "The command line."
                    }),
                },
            }],
            tool_choice: Some("auto"),
            temperature: 0.5,
        };
        assert_eq!(create_request(&request, &config), expected);
    }

    #[test]
    fn test_request_wire_format() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::Assistant(AssistantMessage {
                    content: String::new(),
                    tool_calls: vec![ToolCallRequest::new(
                        "call-1",
                        "add",
                        r#"{"a":1,"b":2}"#,
                    )],
                }),
                ModelMessage::Tool(ToolCallResult {
                    id: "call-1".to_owned(),
                    name: Some("add".to_owned()),
                    content: "3".to_owned(),
                }),
            ],
            tools: vec![],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        let body =
            serde_json::to_value(create_request(&request, &config)).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(
            body["messages"][0],
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call-1",
                    "type": "function",
                    "function": { "name": "add", "arguments": "{\"a\":1,\"b\":2}" }
                }]
            })
        );
        assert_eq!(
            body["messages"][1],
            json!({
                "role": "tool",
                "tool_call_id": "call-1",
                "name": "add",
                "content": "3"
            })
        );
    }

    #[test]
    fn test_parse_structured_tool_calls() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call-1",
                            "type": "function",
                            "function": {
                                "name": "query_data_statistics",
                                "arguments": "{\"metric\":\"sales\"}"
                            }
                        },
                        {
                            "type": "function",
                            "function": {
                                "name": "trigger_simulation",
                                "arguments": { "steps": 10 }
                            }
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let resp = parse_response(completion).unwrap();
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));
        assert_eq!(resp.message.content, "");
        assert_eq!(
            resp.message.tool_calls,
            vec![
                ToolCallRequest::new(
                    "call-1",
                    "query_data_statistics",
                    r#"{"metric":"sales"}"#
                ),
                ToolCallRequest::new(
                    "tool-call-1",
                    "trigger_simulation",
                    r#"{"steps":10}"#
                ),
            ]
        );
    }

    #[test]
    fn test_parse_tool_call_from_content() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": "{\"name\": \"run_dl_prediction\", \"arguments\": {\"model_name\": \"m\"}"
                },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let resp = parse_response(completion).unwrap();
        let call = &resp.message.tool_calls[0];
        assert_eq!(call.id, REPAIRED_TOOL_CALL_ID);
        assert_eq!(call.name, "run_dl_prediction");
        assert_eq!(call.arguments, r#"{"model_name":"m"}"#);
    }

    #[test]
    fn test_parse_plain_answer() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "content": "Sales were 150000 yesterday." },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let resp = parse_response(completion).unwrap();
        assert_eq!(resp.message.content, "Sales were 150000 yesterday.");
        assert!(resp.message.tool_calls.is_empty());
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
    }

    #[test]
    fn test_parse_empty_choices() {
        let completion: ChatCompletion =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = parse_response(completion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResponse);
    }
}
