// livewall-cli/src/lib.rs
//
// Library portion of the livewall CLI: argument definitions, command logic
// and terminal output, shared by the binary and the integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Commands, ConvertArgs, EncodersArgs, ProbeArgs};
pub use commands::{run_convert, run_encoders, run_probe};
