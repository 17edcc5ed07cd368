// ============================================================================
// livewall-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger backend for the `log` facade
//
// The default level is info, `-v` raises it to debug, and RUST_LOG overrides
// both. While progress bars are on screen, log lines are printed through the
// bars' MultiProgress so they do not tear the bars.

// ---- External crate imports ----
use console::style;
use indicatif::MultiProgress;
use log::Level;

// ---- Standard library imports ----
use std::io::{self, Write};

/// Writer that suspends the progress bars while a log line is written.
struct SuspendingWriter {
    multi: MultiProgress,
}

impl Write for SuspendingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Initializes the global logger. Call once, before any work starts.
pub fn init(verbose: bool, multi: &MultiProgress) {
    let default_level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => style("ERROR").red().bold(),
                Level::Warn => style("WARN ").yellow(),
                Level::Info => style("INFO ").green(),
                Level::Debug => style("DEBUG").blue(),
                Level::Trace => style("TRACE").magenta(),
            };
            writeln!(buf, "{} {} {}", buf.timestamp_seconds(), level, record.args())
        })
        .target(env_logger::Target::Pipe(Box::new(SuspendingWriter {
            multi: multi.clone(),
        })))
        .init();

    log::debug!("Logger initialized at {default_level} (RUST_LOG overrides)");
}

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// Used as the run identifier in JSON reports.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
