// ============================================================================
// livewall-cli/src/output.rs
// ============================================================================
//
// TERMINAL OUTPUT: Progress bars, summary table and JSON report
//
// ProgressHandler turns core events into indicatif bars: one overall bar for
// the batch and one bar per file being encoded. Bars hide themselves when
// stderr is not a terminal.

// ---- External crate imports ----
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use livewall_core::events::{Event, EventHandler};
use livewall_core::{BatchReport, ConversionResult, ConversionStatus, format_bytes};
use serde::Serialize;

// ---- Standard library imports ----
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

// ---- Internal crate imports ----
use crate::error::CliResult;
use crate::logging::get_timestamp;

const TICK: Duration = Duration::from_millis(120);

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>9.bold} [{bar:30.cyan/blue}] {pos}/{len} files ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn encode_style() -> ProgressStyle {
    ProgressStyle::with_template("  {percent:>3}% [{bar:30}] {msg} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.")
}

// ============================================================================
// PROGRESS HANDLER
// ============================================================================

/// Renders batch progress. Safe to call from several worker threads.
pub struct ProgressHandler {
    multi: MultiProgress,
    overall: ProgressBar,
    files: Mutex<HashMap<usize, FileBar>>,
}

struct FileBar {
    bar: ProgressBar,
    label: String,
    /// Highest frame seen; ffmpeg occasionally reports going backwards.
    max_frame: u64,
}

impl ProgressHandler {
    #[must_use]
    pub fn new(multi: MultiProgress) -> Self {
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(overall_style());
        overall.set_prefix("Batch");
        Self {
            multi,
            overall,
            files: Mutex::new(HashMap::new()),
        }
    }

    fn files(&self) -> MutexGuard<'_, HashMap<usize, FileBar>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn file_started(&self, index: usize, input: &Path) {
        let bar = self.multi.insert_before(&self.overall, ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        let label = file_label(input);
        bar.set_message(format!("{label}: probing"));
        bar.enable_steady_tick(TICK);
        self.files().insert(
            index,
            FileBar {
                bar,
                label,
                max_frame: 0,
            },
        );
    }

    fn encoder_selected(&self, index: usize, encoder: &str, total_frames: u64) {
        if let Some(file) = self.files().get_mut(&index) {
            file.bar.set_style(encode_style());
            file.bar.set_length(total_frames.max(1));
            file.bar.set_message(format!("{} via {encoder}", file.label));
        }
    }

    fn progress(&self, index: usize, frame: u64, speed: f32) {
        if let Some(file) = self.files().get_mut(&index) {
            if frame >= file.max_frame {
                file.max_frame = frame;
                file.bar.set_position(frame);
            } else {
                log::debug!("Ignoring backward progress: {frame} < {}", file.max_frame);
            }
            if speed > 0.0 {
                file.bar.set_message(format!("{} {speed:.1}x", file.label));
            }
        }
    }

    fn file_finished(&self, index: usize, result: &ConversionResult) {
        if let Some(file) = self.files().remove(&index) {
            file.bar.finish_and_clear();
            self.multi.remove(&file.bar);
        }
        self.overall.inc(1);
        let _ = self.multi.println(status_line(result));
    }
}

impl EventHandler for ProgressHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::BatchStarted { total_files, .. } => {
                self.overall.set_length(*total_files as u64);
                self.overall.enable_steady_tick(TICK);
            }
            Event::FileStarted { index, input, .. } => self.file_started(*index, input),
            Event::EncoderSelected {
                index,
                encoder,
                total_frames,
                ..
            } => self.encoder_selected(*index, &encoder.name(), *total_frames),
            Event::EncodingProgress {
                index,
                frame,
                speed,
                ..
            } => self.progress(*index, *frame, *speed),
            Event::FileFinished { index, result } => self.file_finished(*index, result),
            Event::BatchFinished { .. } => self.overall.finish_and_clear(),
        }
    }
}

/// One-line outcome of a file.
fn status_line(result: &ConversionResult) -> String {
    let name = file_label(&result.input);
    match &result.status {
        ConversionStatus::Succeeded => format!(
            "{} {name} -> {}",
            style("done").green().bold(),
            result
                .output
                .as_deref()
                .map(file_label)
                .unwrap_or_default()
        ),
        ConversionStatus::Failed { kind, .. } => {
            format!("{} {name}: {kind}", style("FAIL").red().bold())
        }
        ConversionStatus::Skipped { reason } => {
            format!("{} {name}: {reason}", style("skip").yellow())
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Prints the per-file status table and the totals to stdout.
pub fn print_summary(report: &BatchReport, dry_run: bool) {
    println!();
    println!("{}", style("Summary").bold().underlined());

    let width = report
        .results
        .iter()
        .map(|r| file_label(&r.input).chars().count())
        .max()
        .unwrap_or(0);

    for result in &report.results {
        let name = file_label(&result.input);
        let (status, detail) = match &result.status {
            ConversionStatus::Succeeded => (
                style("OK     ").green().bold(),
                format!(
                    "{} {} {} {:.1}s",
                    result.output.as_deref().map(file_label).unwrap_or_default(),
                    result.encoder.as_deref().unwrap_or("-"),
                    result.output_size.map(format_bytes).unwrap_or_default(),
                    result.elapsed.as_secs_f64()
                ),
            ),
            ConversionStatus::Failed { kind, reason } => (
                style("FAILED ").red().bold(),
                format!("{kind}: {}", first_line(reason)),
            ),
            ConversionStatus::Skipped { reason } => (style("SKIPPED").yellow(), reason.clone()),
        };
        println!("  {status} {name:<width$}  {detail}");

        if dry_run {
            if let Some(args) = &result.planned_args {
                println!("          ffmpeg {}", shell_join(args));
            }
        }
    }

    println!();
    println!(
        "{} succeeded, {} failed, {} skipped in {:.1}s",
        style(report.succeeded).green().bold(),
        style(report.failed).red().bold(),
        style(report.skipped).yellow(),
        report.elapsed.as_secs_f64()
    );
    if report.failed > 0 {
        println!("{}", style(format!("{} file(s) failed", report.failed)).red().bold());
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Joins arguments for display, quoting those a shell would split.
#[must_use]
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || "[];'\"".contains(c)) {
                format!("'{}'", arg.replace('\'', "'\\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    run: String,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a BatchReport,
}

/// Writes the batch report as pretty JSON to stdout.
pub fn print_json(report: &BatchReport, dry_run: bool) -> CliResult<()> {
    let document = JsonReport {
        run: get_timestamp(),
        dry_run,
        report,
    };
    write_json(&document)
}

/// Writes any serializable value as pretty JSON to stdout.
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| livewall_core::CoreError::JsonParse(e.to_string()))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
