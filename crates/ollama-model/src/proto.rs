//! Wire types of the Ollama `/api/chat` endpoint, and the conversions from
//! and to the unified message types.
//!
//! The native dialect differs from the OpenAI one in two places: tool
//! results are keyed by tool name rather than by call id, and tool call
//! arguments travel as JSON objects rather than encoded strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use toolwright_model::{
    AssistantMessage, ModelFinishReason, ModelMessage, ModelRequest,
    ModelResponse, ModelTool, ToolCallRequest, ToolCallResult,
};
use toolwright_repair::{
    REPAIRED_TOOL_CALL_ID, arguments_to_string, repair_object,
    tool_call_from_content,
};

use crate::OllamaConfig;

/// A message in the native format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System instructions.
    System {
        /// Instruction text.
        content: String,
    },
    /// User input.
    User {
        /// Input text.
        content: String,
    },
    /// Assistant reply.
    Assistant {
        /// Text content.
        #[serde(default)]
        content: String,
        /// Requested tool calls.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Tool result, keyed by the tool name.
    Tool {
        /// The resolved tool name.
        tool_name: String,
        /// The tool output.
        content: String,
    },
}

/// A tool call as Ollama sends and accepts it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id; Ollama does not always assign one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Always `"function"` on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    /// The invoked function.
    pub function: FunctionCall,
}

/// The function part of a [`ToolCall`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Position of the call within its assistant turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Function name.
    #[serde(default)]
    pub name: String,
    /// Arguments. An object on requests; whatever the model produced on
    /// responses.
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Options {
    temperature: f32,
}

/// The `/api/chat` request body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    stream: bool,
    options: Options,
}

/// The `/api/chat` response body, for non-streaming requests.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// The assistant reply.
    pub message: ResponseMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// The message of a [`ChatResponse`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponseMessage {
    /// Text content.
    #[serde(default)]
    pub content: Option<String>,
    /// Structured tool calls, if the model used native tool calling.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

pub(crate) fn create_request(
    req: &ModelRequest,
    config: &OllamaConfig,
) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: create_messages(&req.messages),
        tools: req.tools.iter().map(create_tool).collect(),
        stream: false,
        options: Options {
            temperature: config.temperature,
        },
    }
}

/// Converts unified messages to the native format.
///
/// Order and roles are kept as they are. Tool results get the name of the
/// tool they answer, `unknown_tool_<id>` when the name is unknown, or
/// `unknown_tool` when the id is missing too. Tool call arguments are
/// repaired into objects, falling back to an empty object.
pub fn create_messages(messages: &[ModelMessage]) -> Vec<Message> {
    messages.iter().map(create_message).collect()
}

fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System { content } => Message::System {
            content: content.clone(),
        },
        ModelMessage::User { content } => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(assistant) => Message::Assistant {
            content: assistant.content.clone(),
            tool_calls: assistant
                .tool_calls
                .iter()
                .enumerate()
                .map(|(idx, call)| ToolCall {
                    id: Some(call.id.clone()).filter(|id| !id.is_empty()),
                    r#type: Some("function".to_owned()),
                    function: FunctionCall {
                        index: Some(idx),
                        name: call.name.clone(),
                        arguments: Value::Object(arguments_to_object(
                            &call.arguments,
                        )),
                    },
                })
                .collect(),
        },
        ModelMessage::Tool(result) => Message::Tool {
            tool_name: resolve_tool_name(result),
            content: result.content.clone(),
        },
    }
}

fn resolve_tool_name(result: &ToolCallResult) -> String {
    match (&result.name, result.id.as_str()) {
        (Some(name), _) if !name.is_empty() => name.clone(),
        (_, "") => "unknown_tool".to_owned(),
        (_, id) => format!("unknown_tool_{id}"),
    }
}

fn arguments_to_object(arguments: &str) -> Map<String, Value> {
    repair_object(arguments).unwrap_or_else(|err| {
        warn!("dropping unrepairable tool arguments: {err}");
        Map::new()
    })
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

/// Converts a native response back to the unified form.
pub fn parse_response(resp: ChatResponse) -> ModelResponse {
    ModelResponse {
        message: parse_message(resp.message),
        finish_reason: resp
            .done_reason
            .as_deref()
            .and_then(ModelFinishReason::from_wire),
    }
}

/// Converts a native assistant message to the unified form.
///
/// Arguments become strings: strings are kept, objects are JSON-encoded,
/// anything else becomes `"{}"`. Calls without an id get
/// `ollama-tool-call-<n>`. A message without structured calls is checked
/// for a tool call serialized into its text.
pub fn parse_message(msg: ResponseMessage) -> AssistantMessage {
    let content = msg.content.unwrap_or_default();
    let mut tool_calls: Vec<ToolCallRequest> = msg
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, call)| ToolCallRequest {
            id: call
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("ollama-tool-call-{idx}")),
            name: call.function.name,
            arguments: arguments_to_string(Some(call.function.arguments)),
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

    AssistantMessage {
        content,
        tool_calls,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OllamaConfigBuilder;

    fn conversation() -> Vec<ModelMessage> {
        vec![
            ModelMessage::system("system"),
            ModelMessage::user("query"),
            ModelMessage::Assistant(AssistantMessage {
                content: String::new(),
                tool_calls: vec![ToolCallRequest::new(
                    "call-1",
                    "query_data_statistics",
                    r#"{"business_line":"ecommerce","metric":"sales","date":"2024-01-01"}"#,
                )],
            }),
            ModelMessage::Tool(ToolCallResult {
                id: "call-1".to_owned(),
                name: Some("query_data_statistics".to_owned()),
                content: r#"{"value":"150000"}"#.to_owned(),
            }),
        ]
    }

    #[test]
    fn test_create_messages() {
        let converted = serde_json::to_value(create_messages(&conversation()))
            .unwrap();

        assert_eq!(converted[0], json!({ "role": "system", "content": "system" }));
        let call = &converted[2]["tool_calls"][0];
        assert_eq!(call["type"], "function");
        assert_eq!(call["function"]["index"], 0);
        assert_eq!(call["function"]["name"], "query_data_statistics");
        assert_eq!(
            call["function"]["arguments"],
            json!({
                "business_line": "ecommerce",
                "metric": "sales",
                "date": "2024-01-01"
            })
        );
        assert_eq!(
            converted[3],
            json!({
                "role": "tool",
                "tool_name": "query_data_statistics",
                "content": "{\"value\":\"150000\"}"
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let messages = conversation();
        let converted = create_messages(&messages);
        let Message::Assistant {
            content,
            tool_calls,
        } = converted[2].clone()
        else {
            unreachable!("assistant message expected");
        };

        let back = parse_message(ResponseMessage {
            content: Some(content),
            tool_calls: Some(tool_calls),
        });
        let ModelMessage::Assistant(original) = &messages[2] else {
            unreachable!("assistant message expected");
        };
        assert_eq!(back.tool_calls.len(), 1);
        assert_eq!(back.tool_calls[0].name, original.tool_calls[0].name);

        let arguments: Value =
            serde_json::from_str(&back.tool_calls[0].arguments).unwrap();
        let expected: Value =
            serde_json::from_str(&original.tool_calls[0].arguments).unwrap();
        assert_eq!(arguments, expected);
    }

    #[test]
    fn test_tool_name_resolution() {
        let messages = vec![
            ModelMessage::Tool(ToolCallResult {
                id: "c7".to_owned(),
                name: None,
                content: "ok".to_owned(),
            }),
            ModelMessage::Tool(ToolCallResult {
                id: String::new(),
                name: Some(String::new()),
                content: "ok".to_owned(),
            }),
        ];
        let converted = create_messages(&messages);
        assert_eq!(
            converted,
            vec![
                Message::Tool {
                    tool_name: "unknown_tool_c7".to_owned(),
                    content: "ok".to_owned(),
                },
                Message::Tool {
                    tool_name: "unknown_tool".to_owned(),
                    content: "ok".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_unrepairable_arguments_become_empty_object() {
        let messages = vec![ModelMessage::Assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest::new("", "ping", "[1, 2]")],
        })];
        let converted = serde_json::to_value(create_messages(&messages))
            .unwrap();
        let call = &converted[0]["tool_calls"][0];
        assert!(call.get("id").is_none());
        assert_eq!(call["function"]["arguments"], json!({}));
    }


    #[test]
    fn test_parse_response() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "model": "qwen2.5:14b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    { "function": { "name": "trigger_simulation", "arguments": { "steps": 3 } } },
                    { "function": { "name": "run_dl_prediction", "arguments": "{\"model_name\":\"m\"}" } }
                ]
            },
            "done": true,
            "done_reason": "stop"
        }))
        .unwrap();

        let resp = parse_response(resp);
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
        assert_eq!(
            resp.message.tool_calls,
            vec![
                ToolCallRequest::new(
                    "ollama-tool-call-0",
                    "trigger_simulation",
                    r#"{"steps":3}"#
                ),
                ToolCallRequest::new(
                    "ollama-tool-call-1",
                    "run_dl_prediction",
                    r#"{"model_name":"m"}"#
                ),
            ]
        );
    }

    #[test]
    fn test_parse_tool_call_from_content() {
        let msg = parse_message(ResponseMessage {
            content: Some(
                r#"{"name": "query_bi_report", "args": {"report_id": "r1"}}"#
                    .to_owned(),
            ),
            tool_calls: None,
        });
        assert_eq!(
            msg.tool_calls,
            vec![ToolCallRequest::new(
                REPAIRED_TOOL_CALL_ID,
                "query_bi_report",
                r#"{"report_id":"r1"}"#
            )]
        );
    }

    #[test]
    fn test_create_request() {
        let req = ModelRequest {
            messages: vec![ModelMessage::user("hi")],
            tools: vec![ModelTool {
                name: "ping".to_owned(),
                description: "Pings.".to_owned(),
                parameters: json!({ "type": "object", "properties": {} }),
            }],
        };
        let config = OllamaConfigBuilder::new()
            .with_model("llama3.1")
            .with_temperature(0.5)
            .build();
        let body = serde_json::to_value(create_request(&req, &config)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.1",
                "messages": [{ "role": "user", "content": "hi" }],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "ping",
                        "description": "Pings.",
                        "parameters": { "type": "object", "properties": {} }
                    }
                }],
                "stream": false,
                "options": { "temperature": 0.5 }
            })
        );
    }
}
