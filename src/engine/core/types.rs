use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::formats::TargetFormat;

/// One unit of work: a discovered input and where its conversion goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub target: TargetFormat,
}

impl ConversionJob {
    pub fn new(input_path: PathBuf, output_path: PathBuf, target: TargetFormat) -> Self {
        Self {
            input_path,
            output_path,
            target,
        }
    }

    /// File name of the input, for log lines
    pub fn display_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Copy the video stream, re-encode audio only
    Fast,
    /// Re-encode everything with the transcoder's defaults for the container
    Full,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Fast => write!(f, "fast"),
            Strategy::Full => write!(f, "full"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    /// Process ran and exited non-zero. `None` when killed by a signal.
    Exited(Option<i32>),
    TimedOut,
    SpawnFailed,
}

/// Outcome of a single transcoder invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub strategy: Strategy,
    pub status: AttemptStatus,
    pub diagnostic: Option<String>,
}

impl AttemptResult {
    pub fn success(strategy: Strategy) -> Self {
        Self {
            strategy,
            status: AttemptStatus::Succeeded,
            diagnostic: None,
        }
    }

    pub fn failure(strategy: Strategy, status: AttemptStatus, diagnostic: impl Into<String>) -> Self {
        Self {
            strategy,
            status,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == AttemptStatus::Succeeded
    }
}

/// Counts accumulated over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Files never attempted because the run was cancelled
    #[serde(default)]
    pub cancelled_count: usize,
}

impl ConversionSummary {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn is_complete(&self) -> bool {
        self.processed() + self.cancelled_count == self.total_files
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0 && self.cancelled_count == 0
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done! {} file(s): {} succeeded, {} failed",
            self.total_files, self.success_count, self.failure_count
        )?;
        if self.cancelled_count > 0 {
            write!(f, ", {} cancelled", self.cancelled_count)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Human-readable message for whoever is watching the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Log(LogLine),
    /// Emitted once per file, after its attempts finish
    Progress { completed: usize, total: usize },
    Summary(ConversionSummary),
}

/// Receiver for engine events
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

impl<F> EventSink for F
where
    F: FnMut(EngineEvent),
{
    fn emit(&mut self, event: EngineEvent) {
        self(event)
    }
}

impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

impl EventSink for std::sync::mpsc::Sender<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.send(event);
    }
}
