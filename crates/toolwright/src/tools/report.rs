use serde_json::{Value, json};
use toolwright_core::Object;
use toolwright_core::tool::{Error as ToolError, ToolResult, ToolSpec};

/// Creates the BI report tool.
///
/// The handler picks its fields from the raw argument object, so it is
/// usable with models that only follow the prompt-described tag protocol.
pub fn query_bi_report() -> ToolSpec {
    ToolSpec::new(
        "query_bi_report",
        "Queries a BI report. Arguments: report_id (e.g. SALES_01), date \
         (YYYY-MM-DD)",
        json!({
            "type": "object",
            "properties": {
                "report_id": { "type": "string" },
                "date": { "type": "string" }
            },
            "required": ["report_id", "date"]
        }),
        run,
    )
}

fn run(args: Object) -> ToolResult {
    let field = |key: &str| {
        args.get(key).and_then(Value::as_str).ok_or_else(|| {
            ToolError::invalid_input()
                .with_reason(format!("`{key}` must be a string"))
        })
    };
    Ok(json!({
        "report_id": field("report_id")?,
        "date": field("date")?,
        "summary": "revenue 5M, margin 12%",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run() {
        let args = json!({ "report_id": "SALES_01", "date": "2024-05-01" });
        let Value::Object(args) = args else {
            unreachable!()
        };
        let result = run(args).unwrap();
        assert_eq!(result["report_id"], "SALES_01");
        assert_eq!(result["summary"], "revenue 5M, margin 12%");

        let err = run(Object::new()).unwrap_err();
        assert_eq!(err.reason(), "`report_id` must be a string");
    }
}
