// ============================================================================
// livewall-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Running one encode under a timeout and cancellation
//
// The ffmpeg event iterator blocks until ffmpeg writes something, so it is
// drained on a forwarding thread into a channel. The calling thread polls
// that channel with a short timeout, which lets it notice cancellation or an
// expired deadline while ffmpeg is silent, kill the process and clean up.
//
// KEY COMPONENTS:
// - FfmpegProcess / FfmpegSpawner: seams for the real process and mocks
// - SidecarSpawner: production implementation over ffmpeg-sidecar
// - execute: the bounded event loop producing an ExecutionOutcome

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use log::{debug, error, info, warn};

use crate::cancel::RunControl;
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::processing::encode_plan::EncodeSpec;
use crate::utils::parse_ffmpeg_time;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of trailing ffmpeg log lines kept for diagnostics.
const DIAGNOSTIC_LINES: usize = 40;

// --- FFmpeg Execution Abstraction ---

/// An active ffmpeg process.
pub trait FfmpegProcess: Send {
    /// Hands out the event stream. May only be called once.
    fn take_events(&mut self) -> CoreResult<Receiver<FfmpegEvent>>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>>;

    /// Blocks until the process exits.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    fn kill(&mut self) -> CoreResult<()>;
}

/// Something that can start ffmpeg processes.
pub trait FfmpegSpawner: Sync {
    type Process: FfmpegProcess;

    /// A fresh command pointing at this spawner's ffmpeg binary.
    fn new_command(&self) -> FfmpegCommand {
        FfmpegCommand::new()
    }

    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild`.
pub struct SidecarProcess(FfmpegChild);

impl FfmpegProcess for SidecarProcess {
    fn take_events(&mut self) -> CoreResult<Receiver<FfmpegEvent>> {
        let iterator = self.0.iter().map_err(|e| CoreError::Execution {
            exit_code: None,
            stderr: format!("failed to read ffmpeg output: {e}"),
        })?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for event in iterator {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        Ok(self.0.as_inner_mut().try_wait()?)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.0.wait()?)
    }

    fn kill(&mut self) -> CoreResult<()> {
        match self.0.kill() {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(CoreError::Io(e)),
        }
    }
}

/// Production spawner using `ffmpeg-sidecar`.
#[derive(Debug, Clone)]
pub struct SidecarSpawner {
    ffmpeg: PathBuf,
}

impl SidecarSpawner {
    #[must_use]
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn new_command(&self) -> FfmpegCommand {
        FfmpegCommand::new_with_path(&self.ffmpeg)
    }

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}

// --- Process guard ---

/// Kills and reaps the process on drop unless disarmed.
struct ProcessGuard<'a, P: FfmpegProcess> {
    process: &'a mut P,
    armed: bool,
}

impl<'a, P: FfmpegProcess> ProcessGuard<'a, P> {
    fn new(process: &'a mut P) -> Self {
        Self {
            process,
            armed: true,
        }
    }

    fn process(&mut self) -> &mut P {
        self.process
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<P: FfmpegProcess> Drop for ProcessGuard<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.process.kill() {
                debug!("Failed to kill ffmpeg during cleanup: {e}");
            }
            let _ = self.process.wait();
        }
    }
}

// --- Execution ---

/// Progress snapshot forwarded to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub frame: u64,
    pub time_secs: f64,
    pub fps: f32,
    pub speed: f32,
}

/// Result of a successful ffmpeg run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: ExitStatus,
    pub elapsed: Duration,
    pub last_frame: u64,
    /// Trailing ffmpeg log lines.
    pub diagnostics: String,
}

/// Keeps the last few log lines of a run.
#[derive(Debug, Default)]
struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    fn push(&mut self, line: String) {
        if self.lines.len() == DIAGNOSTIC_LINES {
            self.lines.remove(0);
        }
        self.lines.push(line);
    }

    fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Why the event loop stopped early.
enum Abort {
    Cancelled,
    TimedOut(Duration),
}

fn check_abort(control: &RunControl, start: Instant, deadline: Option<Instant>) -> Option<Abort> {
    if control.cancel.is_cancelled() {
        return Some(Abort::Cancelled);
    }
    match deadline {
        Some(d) if Instant::now() >= d => Some(Abort::TimedOut(start.elapsed())),
        _ => None,
    }
}

/// Runs ffmpeg for `spec`, reporting progress through `on_progress`.
///
/// On a non-zero exit, timeout or cancellation the process is killed (if
/// still running), reaped, and any partial output at `spec.output` is
/// removed. Never retries.
pub fn execute<S: FfmpegSpawner>(
    spawner: &S,
    spec: &EncodeSpec,
    control: &RunControl,
    on_progress: &mut dyn FnMut(&ProgressUpdate),
) -> CoreResult<ExecutionOutcome> {
    if control.cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }
    if let Some(parent) = spec.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut cmd = spawner.new_command();
    cmd.args(spec.to_args());
    debug!("FFmpeg command: {:?}", cmd);

    info!(
        "Starting encode: {} -> {}",
        spec.input.display(),
        spec.output.display()
    );

    let start = Instant::now();
    let deadline = control.deadline_from(start);
    let mut process = spawner.spawn(cmd)?;
    let mut guard = ProcessGuard::new(&mut process);
    let events = guard.process().take_events()?;

    let mut diagnostics = Diagnostics::default();
    let mut last_frame = 0u64;
    let mut abort = None;

    loop {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(FfmpegEvent::Progress(progress)) => {
                last_frame = u64::from(progress.frame);
                let update = ProgressUpdate {
                    frame: last_frame,
                    time_secs: parse_ffmpeg_time(&progress.time).unwrap_or(0.0),
                    fps: progress.fps,
                    speed: progress.speed,
                };
                on_progress(&update);
            }
            Ok(FfmpegEvent::Log(level, message)) => {
                if matches!(level, LogLevel::Error | LogLevel::Fatal) {
                    debug!("ffmpeg: {message}");
                }
                diagnostics.push(message);
            }
            Ok(FfmpegEvent::Error(message)) => {
                debug!("ffmpeg error: {message}");
                diagnostics.push(format!("ERROR: {message}"));
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(reason) = check_abort(control, start, deadline) {
            abort = Some(reason);
            break;
        }
    }

    // Output stream closed; wait for the exit status, still bounded.
    let waited = match abort {
        Some(reason) => Err(reason),
        None => loop {
            if let Some(status) = guard.process().try_wait()? {
                break Ok(status);
            }
            if let Some(reason) = check_abort(control, start, deadline) {
                break Err(reason);
            }
            thread::sleep(POLL_INTERVAL);
        },
    };

    let status = match waited {
        Ok(status) => status,
        Err(reason) => {
            // Guard kills and reaps on drop.
            drop(guard);
            cleanup_partial_output(&spec.output);
            return Err(match reason {
                Abort::Cancelled => {
                    warn!("Encode of {} cancelled", spec.input.display());
                    CoreError::Cancelled
                }
                Abort::TimedOut(after) => {
                    warn!(
                        "Encode of {} timed out after {:.1}s",
                        spec.input.display(),
                        after.as_secs_f64()
                    );
                    CoreError::Timeout {
                        tool: "ffmpeg".to_string(),
                        after,
                    }
                }
            });
        }
    };
    guard.disarm();
    drop(guard);

    let elapsed = start.elapsed();
    if !status.success() && control.cancel.is_cancelled() {
        // ffmpeg got the same Ctrl-C and exited before the token was seen.
        cleanup_partial_output(&spec.output);
        warn!("Encode of {} cancelled ({status})", spec.input.display());
        return Err(CoreError::Cancelled);
    }
    if !status.success() {
        cleanup_partial_output(&spec.output);
        let stderr = diagnostics.render();
        error!(
            "FFmpeg failed for {} ({status}):\n{}",
            spec.input.display(),
            stderr.trim()
        );
        return Err(CoreError::Execution {
            exit_code: status.code(),
            stderr,
        });
    }

    info!(
        "Encode finished for {} in {:.1}s",
        spec.input.display(),
        elapsed.as_secs_f64()
    );
    Ok(ExecutionOutcome {
        status,
        elapsed,
        last_frame,
        diagnostics: diagnostics.render(),
    })
}

/// Removes a partially written output, ignoring a missing file.
pub fn cleanup_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {
            warn!("Removed partial output: {}", path.display());
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            warn!(
                "Failed to remove partial output at {}: {}",
                path.display(),
                err
            );
        }
    }
}
