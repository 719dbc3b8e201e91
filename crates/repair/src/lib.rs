//! Recovers JSON objects from near-miss model output.
//!
//! Weak and local models frequently emit arguments that are almost JSON:
//! a missing closing brace, single quotes, unquoted keys, or a sentence in
//! front of the object. [`repair_object`] walks a ladder of increasingly
//! forgiving strategies and returns the first one that yields an object:
//!
//! 1. strict decoding with `serde_json`;
//! 2. lenient decoding (see the [`lenient`] module docs for what is
//!    accepted);
//! 3. if the text opens an object that is never closed, the missing
//!    closers are appended and step 2 is retried;
//! 4. if the text does not start with `{`, everything before the first `{`
//!    is dropped and the ladder restarts from step 2.
//!
//! The lenient reader is hand-rolled and handles the common mistakes only,
//! it is not a general-purpose JSON repair engine.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
pub mod lenient;

use serde_json::{Map, Value};

pub use error::{Error, ErrorKind};

/// A JSON object, as tool arguments are represented after repair.
pub type Object = Map<String, Value>;

/// Recovers an object from text that is supposed to be a JSON object.
///
/// Parsing to a non-object (a list or a scalar) is a failure, distinct from
/// a successfully parsed empty object.
pub fn repair_object(text: &str) -> Result<Object, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::empty());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => return Ok(object),
        Ok(other) => {
            trace!("strict decode produced {}", value_kind(&other));
        }
        Err(err) => {
            trace!("strict decode failed: {err}");
        }
    }

    repair_lenient(text)
}

fn repair_lenient(text: &str) -> Result<Object, Error> {
    let mut last_err = match lenient::parse(text) {
        Ok(Value::Object(object)) => {
            debug!("recovered arguments with the lenient reader");
            return Ok(object);
        }
        Ok(other) => Error::not_an_object(value_kind(&other)),
        Err(err) => Error::malformed(format!(
            "{} at offset {}",
            err.message, err.offset
        )),
    };

    if text.starts_with('{') {
        if let Some(closed) = close_unbalanced(text) {
            match lenient::parse(&closed) {
                Ok(Value::Object(object)) => {
                    debug!("recovered truncated arguments");
                    return Ok(object);
                }
                Ok(other) => {
                    last_err = Error::not_an_object(value_kind(&other))
                }
                Err(err) => {
                    last_err = Error::malformed(format!(
                        "{} after closing truncated input",
                        err.message
                    ))
                }
            }
        }
    } else if let Some(idx) = text.find('{') {
        debug!("dropping {idx} bytes before the first `{{`");
        return repair_lenient(&text[idx..]);
    }

    Err(last_err)
}

/// Appends the closers for every container (and string) left open in
/// `text`, returning `None` when nothing is open.
fn close_unbalanced(text: &str) -> Option<String> {
    let mut closers = Vec::new();
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                if closers.last() == Some(&c) {
                    closers.pop();
                }
            }
            _ => {}
        }
    }

    if closers.is_empty() && in_string.is_none() {
        return None;
    }

    let mut closed = text.to_owned();
    if let Some(quote) = in_string {
        closed.push(quote);
    }
    closed.extend(closers.iter().rev());
    Some(closed)
}

/// Recovers a serialized `{"name": ..., "arguments": {...}}` tool call
/// from the text content of a reply.
///
/// This is the fallback for backends that do not support native function
/// calling but were prompted to emit the call as text. `args` is accepted
/// as an alias of `arguments`, and missing arguments mean an empty object.
pub fn tool_call_from_content(content: &str) -> Option<(String, Object)> {
    let mut object = repair_object(content).ok()?;
    let Some(Value::String(name)) = object.remove("name") else {
        return None;
    };
    let arguments = object
        .remove("arguments")
        .or_else(|| object.remove("args"));
    let arguments = match arguments {
        None => Object::new(),
        Some(Value::Object(arguments)) => arguments,
        Some(_) => return None,
    };
    Some((name, arguments))
}

/// Id given to a tool call recovered by [`tool_call_from_content`].
pub const REPAIRED_TOOL_CALL_ID: &str = "repaired-tool-call-0";

/// Normalizes the arguments of a native tool call to an encoded JSON
/// object.
///
/// Strings are taken as already encoded. Anything that is neither a string
/// nor an object, including a missing value, becomes `{}`.
pub fn arguments_to_string(arguments: Option<Value>) -> String {
    match arguments {
        Some(Value::String(arguments)) => arguments,
        Some(arguments @ Value::Object(_)) => arguments.to_string(),
        _ => "{}".to_owned(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => unreachable!("not an object"),
        }
    }

    #[test]
    fn test_valid_object_is_unchanged() {
        let text = r#"{"business_line": "ecommerce", "nested": {"n": [1, 2]}}"#;
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(repair_object(text).unwrap(), object(expected));
        assert_eq!(repair_object("{}").unwrap(), Object::new());
    }

    #[test]
    fn test_truncated_object() {
        let repaired = repair_object(
            r#"{"name": "md_read", "args": {"path": "biz/knowledge.md"}"#,
        )
        .unwrap();
        assert_eq!(
            repaired,
            object(json!({
                "name": "md_read",
                "args": { "path": "biz/knowledge.md" }
            }))
        );

        let repaired = repair_object(r#"{"a": [1, 2, {"b": "unfinished"#);
        assert_eq!(
            repaired.unwrap(),
            object(json!({ "a": [1, 2, { "b": "unfinished" }] }))
        );
    }

    #[test]
    fn test_leading_prose_is_stripped() {
        let repaired =
            repair_object(r#"Sure, calling it now: {"a": 1, "b": "two"} ok?"#);
        assert_eq!(repaired.unwrap(), object(json!({ "a": 1, "b": "two" })));

        let repaired = repair_object("result => {path: 'x.md'");
        assert_eq!(repaired.unwrap(), object(json!({ "path": "x.md" })));
    }

    #[test]
    fn test_lenient_syntax() {
        let repaired = repair_object("{name: \"add\", args: {a: 1, b: 2}}");
        assert_eq!(
            repaired.unwrap(),
            object(json!({ "name": "add", "args": { "a": 1, "b": 2 } }))
        );
    }

    #[test]
    fn test_failures() {
        assert_eq!(repair_object("   ").unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(
            repair_object("[1, 2, 3]").unwrap_err().kind(),
            ErrorKind::NotAnObject
        );
        assert_eq!(
            repair_object("42").unwrap_err().kind(),
            ErrorKind::NotAnObject
        );
        assert_eq!(
            repair_object("{:::}").unwrap_err().kind(),
            ErrorKind::Malformed
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let err = repair_object(&format!("{{\"a\": {}", "[".repeat(5_000)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let err = repair_object(&"[".repeat(20_000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(tool_call_from_content(&"[".repeat(20_000)).is_none());
    }

    #[test]
    fn test_close_unbalanced() {
        assert_eq!(close_unbalanced(r#"{"a": 1}"#), None);
        assert_eq!(
            close_unbalanced(r#"{"a": {"b": "}"#).as_deref(),
            Some(r#"{"a": {"b": "}"}}"#)
        );
    }

    #[test]
    fn test_tool_call_from_content() {
        let (name, arguments) = tool_call_from_content(
            r#"{"name": "run_dl_prediction", "arguments": {"model_name": "m", "parameters": {}}}"#,
        )
        .unwrap();
        assert_eq!(name, "run_dl_prediction");
        assert_eq!(
            arguments,
            object(json!({ "model_name": "m", "parameters": {} }))
        );

        let (name, arguments) =
            tool_call_from_content(r#"{"name": "ping"}"#).unwrap();
        assert_eq!(name, "ping");
        assert!(arguments.is_empty());

        assert!(tool_call_from_content("The answer is 42.").is_none());
        assert!(tool_call_from_content(r#"{"tool": "x"}"#).is_none());
        assert!(
            tool_call_from_content(r#"{"name": "x", "arguments": [1]}"#)
                .is_none()
        );
    }

    #[test]
    fn test_arguments_to_string() {
        assert_eq!(arguments_to_string(Some(json!({ "a": 1 }))), r#"{"a":1}"#);
        assert_eq!(
            arguments_to_string(Some(json!(r#"{"a":1}"#))),
            r#"{"a":1}"#
        );
        assert_eq!(arguments_to_string(Some(json!(123))), "{}");
        assert_eq!(arguments_to_string(Some(Value::Null)), "{}");
        assert_eq!(arguments_to_string(None), "{}");
    }
}
