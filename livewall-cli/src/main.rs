// ============================================================================
// livewall-cli/src/main.rs
// ============================================================================
//
// LIVEWALL CLI: Entry point for the livewall binary
//
// Parses arguments, sets up logging and Ctrl-C handling, dispatches to the
// selected command and turns its outcome into the process exit code.

use clap::Parser;
use indicatif::MultiProgress;
use log::{error, warn};

use livewall_cli::commands::{run_convert, run_encoders, run_probe};
use livewall_cli::error::{CliResult, exit_code};
use livewall_cli::{Cli, Commands, logging};
use livewall_core::CancellationToken;

fn main() {
    // clap prints usage errors itself and exits with code 2.
    let cli = Cli::parse();

    let multi = MultiProgress::new();
    logging::init(cli.verbose, &multi);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping after the current step...");
        handler_token.cancel();
    }) {
        warn!("Could not install the Ctrl-C handler: {e}");
    }

    let outcome = dispatch(cli.command, token, &multi);
    if let Err(e) = &outcome {
        error!("{e}");
        eprintln!("Error: {e}");
    }
    std::process::exit(exit_code(&outcome));
}

fn dispatch(command: Commands, token: CancellationToken, multi: &MultiProgress) -> CliResult<bool> {
    match command {
        Commands::Convert(args) => run_convert(&args, token, multi),
        Commands::Probe(args) => run_probe(&args, token),
        Commands::Encoders(args) => run_encoders(&args, token),
    }
}
