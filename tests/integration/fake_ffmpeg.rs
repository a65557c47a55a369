// Drives the real process-spawning invoker against a scripted stand-in for ffmpeg
#![cfg(unix)]

use ffmirror::engine::{
    AttemptStatus, ConversionEngine, ConversionJob, EngineEvent, FfmpegInvoker, RunSettings,
    Strategy, TargetFormat, Transcoder, TranscoderSettings, transcoder_version,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::common::ffmpeg_runner::*;
use crate::common::helpers::*;

fn invoker(script: &Path) -> FfmpegInvoker {
    FfmpegInvoker::new(TranscoderSettings {
        executable: script.to_path_buf(),
        ..Default::default()
    })
}

fn job(fixture: &TreeFixture, name: &str) -> ConversionJob {
    let input = fixture.add(name);
    fs::create_dir_all(&fixture.dest).unwrap();
    ConversionJob::new(input, fixture.dest.join("out.mkv"), TargetFormat::Mkv)
}

#[test]
fn fake_attempt_success() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    let job = job(&fixture, "clip.mp4");
    let result = invoker(&script).attempt(&job, Strategy::Fast);

    assert!(result.succeeded(), "{:?}", result);
    assert_eq!(result.strategy, Strategy::Fast);
    assert_eq!(result.diagnostic, None);
    assert_eq!(fs::read_to_string(&job.output_path).unwrap().trim(), "fast");
}

#[test]
fn fake_attempt_failure_captures_stderr() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    let job = job(&fixture, "broken.mp4");
    let result = invoker(&script).attempt(&job, Strategy::Full);

    assert!(!result.succeeded());
    assert_eq!(result.status, AttemptStatus::Exited(Some(1)));
    let diagnostic = result.diagnostic.unwrap();
    assert!(
        diagnostic.contains("Invalid data found when processing input"),
        "{}",
        diagnostic
    );
}

#[test]
fn fake_attempt_timeout() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    let job = job(&fixture, "slow.mp4");
    let invoker = FfmpegInvoker::new(TranscoderSettings {
        executable: script,
        timeout: Some(Duration::from_millis(300)),
        ..Default::default()
    });

    let started = Instant::now();
    let result = invoker.attempt(&job, Strategy::Fast);

    assert_eq!(result.status, AttemptStatus::TimedOut);
    assert!(result.diagnostic.unwrap().contains("Timed out"));
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "kill should not wait for the child to finish"
    );
}

#[test]
fn fake_attempt_returns_while_background_child_holds_stderr() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    let job = job(&fixture, "orphan.mp4");
    let started = Instant::now();
    let result = invoker(&script).attempt(&job, Strategy::Fast);

    assert!(
        started.elapsed() < Duration::from_secs(4),
        "took {:?}",
        started.elapsed()
    );
    assert_eq!(result.status, AttemptStatus::Exited(Some(1)));
    assert!(result.diagnostic.unwrap().contains("Conversion failed!"));
}

#[test]
fn fake_attempt_keeps_stderr_tail() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    let job = job(&fixture, "noisy.mp4");
    let result = invoker(&script).attempt(&job, Strategy::Full);

    let diagnostic = result.diagnostic.unwrap();
    assert!(diagnostic.len() <= 64 * 1024, "{} bytes kept", diagnostic.len());
    assert!(diagnostic.trim_end().ends_with("noisy.mp4: Conversion failed!"));
}

#[test]
fn fake_version_check() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[]);
    let script = write_fake_ffmpeg(&fixture.temp.path().join("bin")).unwrap();

    assert_eq!(transcoder_version(&script).unwrap(), "ffmpeg version 0.0-fake");
}

#[test]
fn fake_engine_run_with_fallbacks() {
    let _lock = exec_lock();
    let fixture = TreeFixture::new(&[
        "season 1/01 pilot.mp4",
        "season 1/02_fastfail.mkv",
        "season 2/03_broken.avi",
        "extras/cover.jpg",
    ]);
    let bin = fixture.temp.path().join("bin");
    let script = write_fake_ffmpeg(&bin).unwrap();

    let engine = ConversionEngine::new(
        RunSettings::new(&fixture.source, &fixture.dest, TargetFormat::Mp4),
        invoker(&script),
    );
    let mut events: Vec<EngineEvent> = Vec::new();
    let summary = engine.run(&mut events).unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(progress_values(&events), vec![1, 2, 3]);

    assert_eq!(
        fixture.dest_files(),
        vec![
            PathBuf::from("season 1/01 pilot.mp4"),
            PathBuf::from("season 1/02_fastfail.mp4"),
        ]
    );
    let pilot = fs::read_to_string(fixture.dest.join("season 1/01 pilot.mp4")).unwrap();
    let fell_back = fs::read_to_string(fixture.dest.join("season 1/02_fastfail.mp4")).unwrap();
    assert_eq!(pilot.trim(), "fast");
    assert_eq!(fell_back.trim(), "full");

    // One fast try per file, a full try only after a fast failure
    let modes: Vec<String> = fake_calls(&bin)
        .iter()
        .map(|line| line.split_whitespace().next().unwrap_or("").to_string())
        .collect();
    assert_eq!(modes, vec!["fast", "fast", "full", "fast", "full"]);
    assert_eq!(count_logs_containing(&events, "Fast copy failed"), 2);

    // Failed file's folder is still mirrored, directory creation precedes the attempt
    assert!(fixture.dest.join("season 2").is_dir());
}
