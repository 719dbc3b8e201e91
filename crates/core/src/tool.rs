//! Tool call supports.
//!
//! A tool is either a type implementing [`Tool`], whose input is decoded
//! with `serde`, or a [`ToolSpec`] built from a closure that receives the
//! raw argument object and validates it itself. Both kinds are collected
//! into a [`Registry`].

mod error;
mod registry;

use std::fmt::{self, Debug};
use std::future::ready;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use toolwright_repair::Object;

pub use error::{Error, ErrorKind};
pub use registry::Registry;

/// The result of a tool call.
///
/// A string value is used as the observation as it is, any other value is
/// JSON-encoded first.
pub type ToolResult = Result<Value, Error>;

/// A tool that can be called by the model.
///
/// Implementations should hold no mutable state. Anything a tool needs at
/// call time, such as a data source handle, belongs to the tool value and is
/// cloned into the returned future.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

type Handler = Arc<dyn Fn(Object) -> ToolResult + Send + Sync>;

/// A tool defined by a plain `(arguments) -> result` closure.
///
/// The handler receives the argument object untouched, so it is up to the
/// handler to pick and check the fields it needs.
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    parameters: Value,
    handler: Handler,
}

impl ToolSpec {
    /// Creates a tool from its advertised metadata and a handler.
    pub fn new<N, D, F>(
        name: N,
        description: D,
        parameters: Value,
        handler: F,
    ) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(Object) -> ToolResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }

    /// Returns the name of the tool.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

pub(crate) type BoxedToolFuture =
    Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(&self, arguments: Object) -> BoxedToolFuture;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn execute(&self, arguments: Object) -> BoxedToolFuture {
        let input: T::Input =
            match serde_json::from_value(Value::Object(arguments)) {
                Ok(input) => input,
                Err(err) => {
                    let reason = format!("{err}");
                    return Box::pin(ready(ToolResult::Err(
                        Error::invalid_input().with_reason(reason),
                    )));
                }
            };
        Box::pin(self.0.execute(input))
    }
}

impl ToolObject for ToolSpec {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        &self.parameters
    }

    fn execute(&self, arguments: Object) -> BoxedToolFuture {
        // Must run inside the future: panics are caught at the task
        // boundary.
        let handler = Arc::clone(&self.handler);
        Box::pin(async move { handler(arguments) })
    }
}
