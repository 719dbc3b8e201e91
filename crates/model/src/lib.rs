//! An abstraction layer for different LLM backends.
//!
//! This crate establishes a unified protocol for the orchestrator to talk
//! to the supported backend dialects, so that a run can switch between an
//! OpenAI-style gateway and a native Ollama server without touching the
//! loop itself.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
