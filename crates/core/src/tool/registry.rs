use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::{Value, json};
use toolwright_model::ModelTool;
use toolwright_repair::Object;
use tracing::Instrument;

use crate::tool::{
    AnyTool, Error, ErrorKind, Tool, ToolObject, ToolResult, ToolSpec,
};

/// The set of tools offered to the model.
///
/// Tools are keyed by name. Registering a name again replaces the previous
/// tool but keeps its position, so [`schemas`](Self::schemas) always lists
/// tools in first-registration order.
///
/// The registry is built before a run starts and only read afterwards, it
/// is usually shared behind an `Arc`.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed tool.
    pub fn add<T: Tool>(&mut self, tool: T) {
        self.insert(Arc::new(AnyTool(tool)));
    }

    /// Registers a typed tool, builder style.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.add(tool);
        self
    }

    /// Registers a closure-based tool.
    pub fn add_spec(&mut self, spec: ToolSpec) {
        self.insert(Arc::new(spec));
    }

    /// Registers a closure-based tool, builder style.
    #[inline]
    pub fn with_spec(mut self, spec: ToolSpec) -> Self {
        self.add_spec(spec);
        self
    }

    fn insert(&mut self, tool: Arc<dyn ToolObject>) {
        let name = tool.name().to_owned();
        match self.index.get(&name) {
            Some(&idx) => {
                debug!("replacing tool `{name}`");
                self.tools[idx] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns `true` if a tool is registered under `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the schemas of all tools, in registration order.
    pub fn schemas(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Renders the tools as `- name: description` lines, for backends that
    /// learn about tools from the prompt instead of a schema list.
    pub fn describe(&self) -> String {
        if self.tools.is_empty() {
            return "- no tools registered".to_owned();
        }
        self.tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Executes a tool and renders its outcome as an observation for the
    /// model.
    ///
    /// This never fails: an unknown tool, a handler error or a panicking
    /// handler all produce a textual observation instead.
    pub async fn execute(&self, name: &str, arguments: Object) -> String {
        let Some(tool) = self.index.get(name).map(|&idx| &self.tools[idx])
        else {
            let err = Error::not_found()
                .with_reason(format!("tool not registered: {name}"));
            return render_result(name, Err(err));
        };

        trace!("executing `{name}` with args: {arguments:?}");
        let result = match catch_unwind(AssertUnwindSafe(|| {
            tool.execute(arguments)
        })) {
            Ok(fut) => {
                let span = debug_span!("tool execute", tool = name);
                match tokio::spawn(fut.instrument(span)).await {
                    Ok(result) => result,
                    Err(err) if err.is_panic() => Err(panicked()),
                    Err(err) => Err(Error::execution_error()
                        .with_reason(format!("{err}"))),
                }
            }
            Err(_) => Err(panicked()),
        };
        render_result(name, result)
    }
}

#[inline]
fn panicked() -> Error {
    Error::execution_error().with_reason("tool panicked")
}

fn render_result(name: &str, result: ToolResult) -> String {
    match result {
        Ok(Value::String(output)) => output,
        Ok(output) => output.to_string(),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("tool `{name}` not found");
            json!({ "status": "error", "message": err.reason() }).to_string()
        }
        Err(err) => {
            warn!("tool `{name}` failed: {err}");
            format!("tool execution failed: {}", err.reason())
        }
    }
}
