//! qiuqian is a terminal client for a temple fortune-stick (求籤) backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the ritual state machine, the backend client, and chat
//!   streaming with its non-streaming fallback.
//! - [`ui`] renders the ritual and runs the interactive event loop that turns
//!   terminal input into actions.
//! - [`cli`] parses arguments and runs the TUI-less subcommands.
//! - [`logging`] installs the `tracing` subscriber.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
