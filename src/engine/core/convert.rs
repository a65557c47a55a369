use super::error::{DiscoveryError, FilesystemError};
use super::ffmpeg_cmd::Transcoder;
use super::formats::{RecognizedFormatSet, TargetFormat};
use super::paths::map_output_path;
use super::scan::discover;
use super::types::{
    AttemptResult, ConversionJob, ConversionSummary, EngineEvent, EventSink, LogLine, Strategy,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// What to convert and where
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub target: TargetFormat,
    pub formats: RecognizedFormatSet,
}

impl RunSettings {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>, target: TargetFormat) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            target,
            formats: RecognizedFormatSet::default(),
        }
    }

    pub fn with_formats(mut self, formats: RecognizedFormatSet) -> Self {
        self.formats = formats;
        self
    }
}

/// How a single file ended up
#[derive(Debug)]
enum FileOutcome {
    Converted,
    /// Fast failed; full result attached
    FellBack(AttemptResult),
    DirFailed(FilesystemError),
}

/// Drives one batch run: discover, then convert each file in order
pub struct ConversionEngine<T> {
    settings: RunSettings,
    transcoder: T,
}

impl<T: Transcoder> ConversionEngine<T> {
    pub fn new(settings: RunSettings, transcoder: T) -> Self {
        Self {
            settings,
            transcoder,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Build the job list without running anything
    pub fn plan(&self) -> Result<Vec<ConversionJob>, DiscoveryError> {
        let source_root = absolute(&self.settings.source_root);
        let dest_root = absolute(&self.settings.dest_root);
        let files = discover(&source_root, &self.settings.formats)?;

        Ok(files
            .into_iter()
            .map(|input| self.job_for(&source_root, &dest_root, input))
            .collect())
    }

    fn job_for(&self, source_root: &Path, dest_root: &Path, input: PathBuf) -> ConversionJob {
        let ext = self.settings.target.extension();
        let output = map_output_path(source_root, &input, dest_root, ext);
        ConversionJob::new(input, output, self.settings.target)
    }

    /// Run to completion
    pub fn run<S: EventSink>(&self, sink: &mut S) -> Result<ConversionSummary, DiscoveryError> {
        self.run_with_cancel(sink, &AtomicBool::new(false))
    }

    /// Run, checking `cancel` before each file. A file already in progress is
    /// always finished.
    pub fn run_with_cancel<S: EventSink>(
        &self,
        sink: &mut S,
        cancel: &AtomicBool,
    ) -> Result<ConversionSummary, DiscoveryError> {
        sink.emit(EngineEvent::Log(LogLine::info("Starting conversion run...")));

        let jobs = match self.plan() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("Discovery failed: {}", e);
                sink.emit(EngineEvent::Log(LogLine::error(format!("Error: {}", e))));
                sink.emit(EngineEvent::Summary(ConversionSummary::default()));
                return Err(e);
            }
        };

        let total = jobs.len();
        let mut summary = ConversionSummary::new(total);

        if total == 0 {
            sink.emit(EngineEvent::Log(LogLine::warn(
                "No supported video files found in the source folder.",
            )));
            sink.emit(EngineEvent::Summary(summary));
            return Ok(summary);
        }

        sink.emit(EngineEvent::Log(LogLine::info(format!(
            "Found {} video file(s) to convert.",
            total
        ))));

        for (i, job) in jobs.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                summary.cancelled_count = total - i;
                tracing::info!("Run cancelled with {} file(s) left", summary.cancelled_count);
                sink.emit(EngineEvent::Log(LogLine::warn(format!(
                    "Cancelled, {} file(s) not converted.",
                    summary.cancelled_count
                ))));
                break;
            }

            sink.emit(EngineEvent::Log(LogLine::info(format!(
                "({}/{}) Converting: {}",
                i + 1,
                total,
                job.display_name()
            ))));

            match self.convert_one(job, sink) {
                FileOutcome::Converted => {
                    summary.success_count += 1;
                    sink.emit(EngineEvent::Log(LogLine::info(format!(
                        "  -> Saved to: {}",
                        job.output_path.display()
                    ))));
                }
                FileOutcome::FellBack(full) if full.succeeded() => {
                    summary.success_count += 1;
                    sink.emit(EngineEvent::Log(LogLine::info(format!(
                        "  -> Saved to: {}",
                        job.output_path.display()
                    ))));
                }
                FileOutcome::FellBack(full) => {
                    summary.failure_count += 1;
                    tracing::warn!("Both strategies failed for {}", job.input_path.display());
                    sink.emit(EngineEvent::Log(LogLine::error(format!(
                        "  -> Error: conversion of {} failed! Transcoder output:\n{}",
                        job.display_name(),
                        full.diagnostic.as_deref().unwrap_or("").trim_end()
                    ))));
                }
                FileOutcome::DirFailed(e) => {
                    summary.failure_count += 1;
                    tracing::warn!("{}", e);
                    sink.emit(EngineEvent::Log(LogLine::error(format!(
                        "  -> Error: conversion of {} failed! {}",
                        job.display_name(),
                        e
                    ))));
                }
            }

            sink.emit(EngineEvent::Progress {
                completed: i + 1,
                total,
            });
        }

        sink.emit(EngineEvent::Log(LogLine::info(summary.to_string())));
        sink.emit(EngineEvent::Summary(summary));
        Ok(summary)
    }

    fn convert_one<S: EventSink>(&self, job: &ConversionJob, sink: &mut S) -> FileOutcome {
        if let Some(parent) = job.output_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return FileOutcome::DirFailed(FilesystemError {
                    path: parent.to_path_buf(),
                    source: e,
                });
            }
        }

        let fast = self.transcoder.attempt(job, Strategy::Fast);
        if fast.succeeded() {
            return FileOutcome::Converted;
        }

        tracing::debug!(
            "Fast attempt failed for {}: {:?}",
            job.input_path.display(),
            fast.status
        );
        sink.emit(EngineEvent::Log(LogLine::warn(
            "  -> Fast copy failed, retrying with a full re-encode...",
        )));

        FileOutcome::FellBack(self.transcoder.attempt(job, Strategy::Full))
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
