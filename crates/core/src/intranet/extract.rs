const OPEN_TAGS: [&str; 3] = ["<tool_call>", "<toolcall>", "<tool call>"];
const CLOSE_TAGS: [&str; 3] = ["</tool_call", "</toolcall", "</tool call"];

/// Finds the payload of the first tool call tag in a model reply.
///
/// Models tend to misspell the delimiters, so `<tool_call>`, `<toolcall>`
/// and `<tool call>` are all accepted, and the closing `>` is optional.
/// A missing closing tag makes the payload run to the end of the text.
///
/// Returns `None` if there is no opening tag or the payload is blank.
pub fn extract_tool_call(text: &str) -> Option<&str> {
    let (start, open) = OPEN_TAGS
        .iter()
        .filter_map(|tag| text.find(tag).map(|pos| (pos, tag.len())))
        .min_by_key(|(pos, _)| *pos)?;
    let rest = &text[start + open..];

    let end = CLOSE_TAGS
        .iter()
        .filter_map(|tag| rest.find(tag))
        .min()
        .unwrap_or(rest.len());
    let payload = rest[..end].trim();
    (!payload.is_empty()).then_some(payload)
}
