use super::types::{EngineEvent, EventSink, LogLevel};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appends engine log lines to a file, one timestamped entry per line.
/// Progress events are not written; the summary is.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Open (or create) the log file in append mode
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, level: LogLevel, message: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let tag = match level {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        writeln!(self.file, "[{}] {:5} {}", timestamp, tag, message)?;
        Ok(())
    }
}

impl EventSink for RunLog {
    fn emit(&mut self, event: EngineEvent) {
        let written = match &event {
            EngineEvent::Log(line) => self.write_line(line.level, &line.message),
            EngineEvent::Summary(summary) => self.write_line(
                LogLevel::Info,
                &format!(
                    "summary total={} succeeded={} failed={} cancelled={}",
                    summary.total_files,
                    summary.success_count,
                    summary.failure_count,
                    summary.cancelled_count
                ),
            ),
            EngineEvent::Progress { .. } => Ok(()),
        };

        if let Err(e) = written {
            tracing::warn!("Could not write to {}: {:#}", self.path.display(), e);
        }
    }
}
