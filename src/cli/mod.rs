//! Command Line Interface (CLI) layer for canvasprep.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the `normalize`, `detect`,
//! `blur` and `split` subcommands. It wires user-provided options to the
//! library functionality exposed via `canvasprep::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
