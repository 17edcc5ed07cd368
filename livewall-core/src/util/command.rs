//! Bounded execution of short-lived external commands (ffprobe, encoder
//! listing, hardware test encodes).
//!
//! The child is polled with `try_wait` so that a timeout or a cancellation
//! request can kill it. Stdout and stderr are drained on reader threads to
//! keep the pipes from filling up while we poll.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::cancel::RunControl;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Renders a command line for logging.
pub fn describe_command(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Runs `cmd` to completion within the limits of `control`.
///
/// Returns the output whatever the exit status; see [`run_command_checked`]
/// for the variant that treats a non-zero exit as an error.
pub fn run_command(cmd: &mut Command, tool: &str, control: &RunControl) -> CoreResult<CommandOutput> {
    debug!("Running: {}", describe_command(cmd));

    if control.cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(tool, e))?;

    let stdout_handle = child.stdout.take().map(spawn_reader);
    let stderr_handle = child.stderr.take().map(spawn_stderr_reader);

    let start = Instant::now();
    let deadline = control.deadline_from(start);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                kill_and_reap(&mut child, tool);
                return Err(CoreError::Io(e));
            }
        }

        if control.cancel.is_cancelled() {
            debug!("{tool}: cancellation requested, killing process");
            kill_and_reap(&mut child, tool);
            return Err(CoreError::Cancelled);
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                warn!("{tool} exceeded its time limit, killing process");
                kill_and_reap(&mut child, tool);
                return Err(CoreError::Timeout {
                    tool: tool.to_string(),
                    after: start.elapsed(),
                });
            }
        }

        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_reader(stdout_handle);
    let stderr = join_reader(stderr_handle);

    // Ctrl-C reaches the child too; its exit may be seen before the token.
    if !status.success() && control.cancel.is_cancelled() {
        debug!("{tool} exited with {status} after cancellation");
        return Err(CoreError::Cancelled);
    }

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

/// Like [`run_command`], but a non-zero exit becomes `CommandFailed`.
pub fn run_command_checked(
    cmd: &mut Command,
    tool: &str,
    control: &RunControl,
) -> CoreResult<CommandOutput> {
    let output = run_command(cmd, tool, control)?;
    if !output.status.success() {
        return Err(command_failed_error(tool, output.status, output.stderr.trim()));
    }
    Ok(output)
}

fn kill_and_reap(child: &mut Child, tool: &str) {
    if let Err(e) = child.kill() {
        debug!("{tool}: kill failed (process may have exited): {e}");
    }
    // Reap so no zombie is left behind.
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let mut reader = BufReader::new(reader);
        if let Err(e) = reader.read_to_string(&mut buf) {
            debug!("Failed to read process output: {e}");
        }
        buf
    })
}

fn spawn_stderr_reader<R: Read + Send + 'static>(reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut lines = Vec::new();
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            debug!("STDERR: {line}");
            lines.push(line);
        }
        lines.join("\n")
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;

    #[test]
    fn test_run_command_captures_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let output = run_command(&mut cmd, "echo", &RunControl::default()).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_checked_run_reports_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_command_checked(&mut cmd, "sh", &RunControl::default()).unwrap_err();
        match err {
            CoreError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_kills_process() {
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let control = RunControl::new(CancellationToken::new(), Some(Duration::from_millis(200)));
        let start = Instant::now();
        let err = run_command(&mut cmd, "sleep", &control).unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_failed_exit_after_cancel_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("interrupted");
        let script = format!(
            "while [ ! -f '{}' ]; do sleep 0.01; done; exit 255",
            flag.display()
        );
        let mut cmd = Command::new("sh");
        cmd.args(["-c", &script]);

        let token = CancellationToken::new();
        let control = RunControl::new(token.clone(), None);
        let interrupter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            // The interrupt lands on the token and the child together.
            token.cancel();
            std::fs::write(&flag, b"").unwrap();
        });

        let err = run_command(&mut cmd, "sh", &control).unwrap_err();
        interrupter.join().unwrap();
        assert!(matches!(err, CoreError::Cancelled), "got {err:?}");
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let control = RunControl::new(token, None);
        let mut cmd = Command::new("echo");
        let err = run_command(&mut cmd, "echo", &control).unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }

    #[test]
    fn test_missing_binary_is_start_error() {
        let mut cmd = Command::new("/nonexistent/livewall-test-binary");
        let err = run_command(&mut cmd, "missing", &RunControl::default()).unwrap_err();
        assert!(matches!(err, CoreError::CommandStart(..)));
    }

    #[test]
    fn test_describe_command() {
        let mut cmd = Command::new("ffprobe");
        cmd.args(["-v", "error"]);
        assert_eq!(describe_command(&cmd), "ffprobe -v error");
    }
}
