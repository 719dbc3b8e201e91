use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};
use toolwright_core::tool::{Tool, ToolResult};

const NO_DATA: &str = "no data";

#[derive(Deserialize, JsonSchema)]
pub struct QueryDataStatisticsParameters {
    #[schemars(description = "The business line, e.g. `ecommerce`.")]
    business_line: String,
    #[schemars(description = "The metric to query, e.g. `sales` or `dau`.")]
    metric: String,
    #[schemars(description = "The date in `YYYY-MM-DD` format.")]
    date: String,
}

/// A tool for querying business line metrics from the data warehouse.
pub struct QueryDataStatisticsTool {
    parameter_schema: Value,
}

impl QueryDataStatisticsTool {
    /// Creates a new statistics tool.
    #[inline]
    pub fn new() -> Self {
        QueryDataStatisticsTool {
            parameter_schema: schema_for!(QueryDataStatisticsParameters)
                .to_value(),
        }
    }
}

impl Default for QueryDataStatisticsTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for QueryDataStatisticsTool {
    type Input = QueryDataStatisticsParameters;

    fn name(&self) -> &str {
        "query_data_statistics"
    }

    fn description(&self) -> &str {
        "Queries statistics of a business line, such as sales or DAU."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: QueryDataStatisticsParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let value = lookup(&input.business_line, &input.metric);
            Ok(json!({
                "status": "success",
                "source": "mock-data-warehouse",
                "business_line": input.business_line,
                "metric": input.metric,
                "date": input.date,
                "value": value,
            }))
        }
    }
}

fn lookup(business_line: &str, metric: &str) -> &'static str {
    match (business_line, metric) {
        ("ecommerce", "sales") => "150000",
        ("ecommerce", "dau") => "12000",
        ("gaming", "sales") => "80000",
        ("gaming", "dau") => "45000",
        _ => NO_DATA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query() {
        let tool = QueryDataStatisticsTool::new();

        let result = tool
            .execute(QueryDataStatisticsParameters {
                business_line: "gaming".to_owned(),
                metric: "dau".to_owned(),
                date: "2024-05-01".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(result["value"], "45000");
        assert_eq!(result["date"], "2024-05-01");

        let result = tool
            .execute(QueryDataStatisticsParameters {
                business_line: "finance".to_owned(),
                metric: "sales".to_owned(),
                date: "2024-05-01".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(result["value"], NO_DATA);
    }

    #[test]
    fn test_schema() {
        let tool = QueryDataStatisticsTool::new();
        let required = tool.parameter_schema()["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }
}
