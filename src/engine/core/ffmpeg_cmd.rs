use super::types::{AttemptResult, AttemptStatus, ConversionJob, Strategy};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Only the end of stderr is kept as the diagnostic
const STDERR_TAIL_BYTES: usize = 64 * 1024;

/// How long to keep draining stderr once the process itself is gone. A
/// grandchild can keep the pipe open well past that.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Runs one conversion attempt for a job. The engine only talks to this.
pub trait Transcoder {
    fn attempt(&self, job: &ConversionJob, strategy: Strategy) -> AttemptResult;
}

impl<T: Transcoder + ?Sized> Transcoder for std::sync::Arc<T> {
    fn attempt(&self, job: &ConversionJob, strategy: Strategy) -> AttemptResult {
        (**self).attempt(job, strategy)
    }
}

/// How the external executable gets called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscoderSettings {
    pub executable: PathBuf,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Inserted before the output path for both strategies
    pub extra_args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for TranscoderSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("ffmpeg"),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            extra_args: Vec::new(),
            timeout: None,
        }
    }
}

/// Build the argument list (without the program) for one strategy
pub fn build_args(
    settings: &TranscoderSettings,
    input: &Path,
    output: &Path,
    strategy: Strategy,
) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-y".to_string(),
    ];

    if strategy == Strategy::Fast {
        args.extend([
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            settings.audio_codec.clone(),
            "-b:a".to_string(),
            settings.audio_bitrate.clone(),
        ]);
    }

    args.extend(settings.extra_args.iter().cloned());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Build the transcoder command for a job
pub fn build_transcode_cmd(
    settings: &TranscoderSettings,
    job: &ConversionJob,
    strategy: Strategy,
) -> Command {
    let mut cmd = Command::new(&settings.executable);
    cmd.args(build_args(settings, &job.input_path, &job.output_path, strategy));
    hide_console_window(&mut cmd);
    cmd
}

/// Render a command as a copy-pasteable shell line
pub fn format_transcode_cmd(cmd: &Command) -> String {
    let parts: Vec<String> = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect();

    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

#[cfg(windows)]
fn hide_console_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_cmd: &mut Command) {}

/// Outcome of waiting on a child process
enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
}

fn wait_with_deadline(child: &mut Child, timeout: Option<Duration>) -> Result<WaitOutcome> {
    let Some(timeout) = timeout else {
        let status = child.wait().context("Failed to wait for transcoder")?;
        return Ok(WaitOutcome::Exited(status));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().context("Failed to poll transcoder")? {
            return Ok(WaitOutcome::Exited(status));
        }
        if Instant::now() >= deadline {
            // Already-exited races are harmless here, wait() reaps either way
            let _ = child.kill();
            child.wait().context("Failed to reap timed-out transcoder")?;
            return Ok(WaitOutcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Append `chunk` to `buf`, dropping the oldest bytes past `limit`
fn push_tail(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) {
    buf.extend_from_slice(chunk);
    if buf.len() > limit {
        let excess = buf.len() - limit;
        buf.drain(..excess);
    }
}

/// Run a command once, returning how it ended and the tail of its stderr
fn run_once(mut cmd: Command, timeout: Option<Duration>) -> Result<(WaitOutcome, String)> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().context("Failed to spawn transcoder")?;

    let mut stderr = child.stderr.take().context("Failed to capture stderr")?;
    let tail = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel::<()>();
    {
        let tail = Arc::clone(&tail);
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match stderr.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = tail.lock() {
                            push_tail(&mut buf, &chunk[..n], STDERR_TAIL_BYTES);
                        }
                    }
                }
            }
            let _ = done_tx.send(());
        });
    }

    let outcome = wait_with_deadline(&mut child, timeout)?;

    // The reader is left behind if something else still holds the pipe
    if done_rx.recv_timeout(STDERR_GRACE).is_err() {
        tracing::debug!("stderr still open after the transcoder exited, not waiting for it");
    }

    let stderr_output = match tail.lock() {
        Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => "Failed to capture stderr".to_string(),
    };

    Ok((outcome, stderr_output))
}

/// Calls the real transcoder executable
#[derive(Debug, Clone, Default)]
pub struct FfmpegInvoker {
    settings: TranscoderSettings,
}

impl FfmpegInvoker {
    pub fn new(settings: TranscoderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TranscoderSettings {
        &self.settings
    }
}

impl Transcoder for FfmpegInvoker {
    fn attempt(&self, job: &ConversionJob, strategy: Strategy) -> AttemptResult {
        let cmd = build_transcode_cmd(&self.settings, job, strategy);
        tracing::debug!("[{}] {}", strategy, format_transcode_cmd(&cmd));

        match run_once(cmd, self.settings.timeout) {
            Ok((WaitOutcome::Exited(status), _)) if status.success() => {
                AttemptResult::success(strategy)
            }
            Ok((WaitOutcome::Exited(status), stderr)) => {
                tracing::debug!(
                    "{} attempt failed for {} with status {}",
                    strategy,
                    job.input_path.display(),
                    status
                );
                AttemptResult::failure(strategy, AttemptStatus::Exited(status.code()), stderr)
            }
            Ok((WaitOutcome::TimedOut, stderr)) => {
                let secs = self.settings.timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                tracing::warn!(
                    "{} attempt for {} timed out after {:.1}s",
                    strategy,
                    job.input_path.display(),
                    secs
                );
                AttemptResult::failure(
                    strategy,
                    AttemptStatus::TimedOut,
                    format!("Timed out after {:.1}s\n{}", secs, stderr),
                )
            }
            Err(e) => AttemptResult::failure(strategy, AttemptStatus::SpawnFailed, format!("{:#}", e)),
        }
    }
}
