// Runs against a real ffmpeg when one is installed; skipped otherwise
use ffmirror::engine::{
    ConversionEngine, EngineEvent, FfmpegInvoker, RunSettings, TargetFormat, TranscoderSettings,
    transcoder_version,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::ffmpeg_runner::*;
use crate::common::helpers::*;

macro_rules! require_ffmpeg {
    () => {
        if !is_ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available");
            return;
        }
    };
}

// ============================================================================
// SETUP: Test fixtures
// ============================================================================

fn real_invoker() -> FfmpegInvoker {
    FfmpegInvoker::new(TranscoderSettings {
        timeout: Some(Duration::from_secs(120)),
        ..Default::default()
    })
}

fn video_tree(root: &Path) {
    generate_test_video(&root.join("trip/day1.avi"), 1.0).expect("Failed to generate test video");
    generate_test_video(&root.join("trip/day2/clip.mkv"), 1.0)
        .expect("Failed to generate test video");
    fs::write(root.join("trip/notes.txt"), b"not a video").unwrap();
}

fn assert_non_empty(path: &Path) {
    let meta = fs::metadata(path).unwrap_or_else(|_| panic!("missing output {}", path.display()));
    assert!(meta.len() > 0, "empty output {}", path.display());
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn e2e_version_line() {
    require_ffmpeg!();
    let _lock = exec_lock();

    let line = transcoder_version(Path::new("ffmpeg")).unwrap();
    assert!(line.starts_with("ffmpeg version"), "{}", line);
}

#[test]
fn e2e_mirror_into_mkv() {
    require_ffmpeg!();
    let _lock = exec_lock();

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    video_tree(&source);

    let engine = ConversionEngine::new(
        RunSettings::new(&source, &dest, TargetFormat::Mkv),
        real_invoker(),
    );
    let mut events: Vec<EngineEvent> = Vec::new();
    let summary = engine.run(&mut events).unwrap();

    assert_eq!(summary.total_files, 2);
    assert!(summary.all_succeeded(), "{:?}", log_lines(&events));
    assert_non_empty(&dest.join("trip/day1.mkv"));
    assert_non_empty(&dest.join("trip/day2/clip.mkv"));
    assert!(!dest.join("trip/notes.txt").exists());
}

#[test]
fn e2e_mirror_into_mp4() {
    require_ffmpeg!();
    let _lock = exec_lock();

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    video_tree(&source);

    let engine = ConversionEngine::new(
        RunSettings::new(&source, &dest, TargetFormat::Mp4),
        real_invoker(),
    );
    let mut events: Vec<EngineEvent> = Vec::new();
    let summary = engine.run(&mut events).unwrap();

    assert!(summary.all_succeeded(), "{:?}", log_lines(&events));
    assert_eq!(progress_values(&events), vec![1, 2]);
    assert_non_empty(&dest.join("trip/day1.mp4"));
    assert_non_empty(&dest.join("trip/day2/clip.mp4"));
}

#[test]
fn e2e_corrupt_input_fails_without_stopping() {
    require_ffmpeg!();
    let _lock = exec_lock();

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    let dest = temp.path().join("out");
    generate_test_video(&source.join("a_good.avi"), 1.0).expect("Failed to generate test video");
    fs::write(source.join("b_garbage.mp4"), b"definitely not a video stream").unwrap();
    generate_test_video(&source.join("c_good.avi"), 1.0).expect("Failed to generate test video");

    let engine = ConversionEngine::new(
        RunSettings::new(&source, &dest, TargetFormat::Mkv),
        real_invoker(),
    );
    let mut events: Vec<EngineEvent> = Vec::new();
    let summary = engine.run(&mut events).unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(count_logs_containing(&events, "b_garbage.mp4 failed"), 1);
    assert_non_empty(&dest.join("c_good.mkv"));
}
