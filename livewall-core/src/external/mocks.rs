// livewall-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---
//
// Stand-ins for ffmpeg and ffprobe so the pipeline can be exercised without
// the real binaries. Everything is behind `Arc<Mutex<..>>` because the batch
// runner shares spawner and prober across worker threads.

use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;

use super::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::cancel::{CancellationToken, RunControl};
use crate::error::{CoreError, CoreResult, command_start_error, probe_error};
use crate::media::{FrameRate, Prober, SourceMedia};

/// Raw wait status of a process killed by SIGKILL.
const KILLED_STATUS: i32 = 9;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    events: Vec<FfmpegEvent>,
    exit_status: ExitStatus,
    /// Keep running (and keep the event stream open) until killed.
    hang: bool,
    killed: Arc<AtomicBool>,
    kill_counter: Arc<AtomicUsize>,
    sender: Option<Sender<FfmpegEvent>>,
    /// Cancelled once the event stream is handed out.
    interrupt: Option<CancellationToken>,
}

impl MockFfmpegProcess {
    fn is_running(&self) -> bool {
        self.hang && !self.killed.load(Ordering::SeqCst)
    }

    fn final_status(&self) -> ExitStatus {
        if self.killed.load(Ordering::SeqCst) {
            ExitStatus::from_raw(KILLED_STATUS)
        } else {
            self.exit_status
        }
    }
}

impl FfmpegProcess for MockFfmpegProcess {
    fn take_events(&mut self) -> CoreResult<Receiver<FfmpegEvent>> {
        let (tx, rx) = mpsc::channel();
        for event in self.events.drain(..) {
            // Receiver is alive; cannot fail.
            let _ = tx.send(event);
        }
        if self.hang {
            self.sender = Some(tx);
        }
        if let Some(token) = self.interrupt.take() {
            token.cancel();
        }
        Ok(rx)
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        if self.is_running() {
            Ok(None)
        } else {
            Ok(Some(self.final_status()))
        }
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.final_status())
    }

    fn kill(&mut self) -> CoreResult<()> {
        if !self.killed.swap(true, Ordering::SeqCst) {
            self.kill_counter.fetch_add(1, Ordering::SeqCst);
        }
        self.sender = None;
        Ok(())
    }
}

/// What a matched expectation does.
#[derive(Clone)]
pub enum MockBehavior {
    /// Emit events, then exit with the given raw status.
    Exit {
        events: Vec<FfmpegEvent>,
        exit_code: i32,
        create_dummy_output: bool,
    },
    /// Cancel `token` as the stream opens, then exit with `exit_code`
    /// without further events, like ffmpeg receiving the same Ctrl-C.
    Interrupted {
        token: CancellationToken,
        exit_code: i32,
    },
    /// Write some output, then run until killed.
    Hang,
    /// Fail to start.
    SpawnError,
}

/// Represents an expected ffmpeg call and its mock result.
struct MockFfmpegExpectation {
    arg_pattern: String,
    behavior: MockBehavior,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn consumes the first expectation whose pattern occurs in any
/// argument. Unmatched spawns fail to start.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    kills: Arc<AtomicUsize>,
}

impl MockFfmpegSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expectation(&self, arg_pattern: &str, behavior: MockBehavior) {
        lock(&self.expectations).push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            behavior,
        });
    }

    pub fn add_success_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>) {
        self.add_expectation(
            arg_pattern,
            MockBehavior::Exit {
                events,
                exit_code: 0,
                create_dummy_output: true,
            },
        );
    }

    /// Exits with `exit_code` (a process exit code, not a raw status).
    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        self.add_expectation(
            arg_pattern,
            MockBehavior::Exit {
                events,
                exit_code,
                create_dummy_output: true,
            },
        );
    }

    pub fn add_interrupted_expectation(
        &self,
        arg_pattern: &str,
        token: CancellationToken,
        exit_code: i32,
    ) {
        self.add_expectation(arg_pattern, MockBehavior::Interrupted { token, exit_code });
    }

    pub fn add_hang_expectation(&self, arg_pattern: &str) {
        self.add_expectation(arg_pattern, MockBehavior::Hang);
    }

    #[must_use]
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        lock(&self.received_calls).clone()
    }

    /// Number of processes that were killed.
    #[must_use]
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    fn write_dummy_output(args: &[String]) {
        let Some(output) = args.last() else {
            log::warn!("MockFfmpegSpawner couldn't find output path in args");
            return;
        };
        let output = PathBuf::from(output);
        if let Some(parent) = output.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&output, b"mock output") {
            log::error!("MockFfmpegSpawner failed to create {}: {e}", output.display());
        }
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        lock(&self.received_calls).push(args.clone());

        let behavior = {
            let mut expectations = lock(&self.expectations);
            let found = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            match found {
                Some(index) => expectations.remove(index).behavior,
                None => {
                    log::error!("MockFfmpegSpawner: no expectation for args {args:?}");
                    return Err(command_start_error(
                        "ffmpeg (mock)",
                        io::Error::other("no matching expectation"),
                    ));
                }
            }
        };

        let killed = Arc::new(AtomicBool::new(false));
        match behavior {
            MockBehavior::SpawnError => Err(command_start_error(
                "ffmpeg (mock)",
                io::Error::new(io::ErrorKind::NotFound, "simulated spawn failure"),
            )),
            MockBehavior::Hang => {
                Self::write_dummy_output(&args);
                Ok(MockFfmpegProcess {
                    events: Vec::new(),
                    exit_status: ExitStatus::from_raw(0),
                    hang: true,
                    killed,
                    kill_counter: self.kills.clone(),
                    sender: None,
                    interrupt: None,
                })
            }
            MockBehavior::Interrupted { token, exit_code } => {
                Self::write_dummy_output(&args);
                Ok(MockFfmpegProcess {
                    events: Vec::new(),
                    exit_status: ExitStatus::from_raw(exit_code << 8),
                    hang: false,
                    killed,
                    kill_counter: self.kills.clone(),
                    sender: None,
                    interrupt: Some(token),
                })
            }
            MockBehavior::Exit {
                events,
                exit_code,
                create_dummy_output,
            } => {
                if create_dummy_output {
                    Self::write_dummy_output(&args);
                }
                Ok(MockFfmpegProcess {
                    events,
                    // Raw wait status encodes the exit code in the high byte.
                    exit_status: ExitStatus::from_raw(exit_code << 8),
                    hang: false,
                    killed,
                    kill_counter: self.kills.clone(),
                    sender: None,
                    interrupt: None,
                })
            }
        }
    }
}

/// Mock prober answering from a table keyed by path.
#[derive(Clone, Default)]
pub struct MockProber {
    results: Arc<Mutex<HashMap<PathBuf, Result<SourceMedia, String>>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockProber {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A plausible description of `path`.
    #[must_use]
    pub fn media(path: &Path, width: u32, height: u32, duration_secs: f64, fps: u32) -> SourceMedia {
        SourceMedia {
            path: path.to_path_buf(),
            width,
            height,
            duration_secs,
            frame_rate: FrameRate::integer(fps),
            rotation: 0,
            frame_count: None,
            video_codec: Some("h264".to_string()),
            audio: None,
            size_bytes: None,
        }
    }

    pub fn expect(&self, path: &Path, media: SourceMedia) {
        lock(&self.results).insert(path.to_path_buf(), Ok(media));
    }

    pub fn expect_failure(&self, path: &Path, reason: &str) {
        lock(&self.results).insert(path.to_path_buf(), Err(reason.to_string()));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<PathBuf> {
        lock(&self.calls).clone()
    }
}

impl Prober for MockProber {
    fn probe(&self, path: &Path, control: &RunControl) -> CoreResult<SourceMedia> {
        lock(&self.calls).push(path.to_path_buf());
        if control.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        match lock(&self.results).get(path) {
            Some(Ok(media)) => Ok(media.clone()),
            Some(Err(reason)) => Err(probe_error(path, reason.clone())),
            None => Err(probe_error(path, "MockProber: no expectation set")),
        }
    }
}
