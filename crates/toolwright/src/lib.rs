//! An out-of-the-box tool-calling assistant for enterprise intranet models.
//!
//! The crate includes a CLI tool for using in the terminal, which can also
//! serve the orchestrator over HTTP (see [`server`]). It assembles the
//! loops from [`toolwright_core`], the backend adapters and a set of mock
//! enterprise tools, all configured from the environment.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod server;
mod session;
mod settings;
pub mod tools;

pub use session::{Session, SessionBuilder};
pub use settings::{Backend, Mode, Settings};

/// Re-exports of [`toolwright_core`] crate.
pub mod core {
    pub use toolwright_core::*;
}
