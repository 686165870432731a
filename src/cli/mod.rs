//! Command-line interface.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
