//! Core logic including the tool-calling loops, tool registry, trace sinks,
//! etc.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod error;
mod intranet;
pub mod memory;
mod model_client;
mod orchestrator;
mod outcome;
pub mod tool;
pub mod trace;

pub use error::{Error, ErrorKind};
pub use intranet::{
    IntranetAgent, IntranetAgentBuilder, ROUND_LIMIT_ANSWER, extract_tool_call,
    system_prompt,
};
pub use orchestrator::{
    DEFAULT_SYSTEM_PROMPT, Orchestrator, OrchestratorBuilder, STEP_LIMIT_ANSWER,
};
pub use outcome::{RunOutcome, RunStatus, ToolTrace};
pub use toolwright_repair::Object;
