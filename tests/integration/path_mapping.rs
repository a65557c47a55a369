// Property tests for output path mapping

use ffmirror::engine::{TargetFormat, map_output_path, relative_dir};
use proptest::prelude::*;
use std::path::{Component, Path, PathBuf};

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_ .-]{0,8}"
}

fn target() -> impl Strategy<Value = TargetFormat> {
    prop::sample::select(TargetFormat::ALL.to_vec())
}

proptest! {
    #[test]
    fn proptest_output_preserves_relative_dir(
        dirs in prop::collection::vec(segment(), 0..4),
        stem in segment(),
        format in target(),
    ) {
        let source = Path::new("/library/in");
        let dest = Path::new("/library/out");

        let mut file = source.to_path_buf();
        for dir in &dirs {
            file.push(dir);
        }
        file.push(format!("{}.mp4", stem));

        let out = map_output_path(source, &file, dest, format.extension());

        prop_assert!(out.starts_with(dest));
        let expected_rel: PathBuf = dirs.iter().collect();
        prop_assert_eq!(out.parent().unwrap().strip_prefix(dest).unwrap(), expected_rel.as_path());
        prop_assert_eq!(relative_dir(source, &file), expected_rel);
        prop_assert_eq!(out.extension().and_then(|e| e.to_str()), Some(format.extension()));
        prop_assert_eq!(out.file_stem().and_then(|s| s.to_str()), Some(stem.as_str()));
    }

    #[test]
    fn proptest_hostile_segments_never_escape(
        parts in prop::collection::vec(
            prop_oneof![
                Just("..".to_string()),
                Just(".".to_string()),
                segment(),
            ],
            0..6,
        ),
        stem in segment(),
    ) {
        let source = Path::new("/library/in");
        let dest = Path::new("/library/out");

        let mut file = source.to_path_buf();
        for part in &parts {
            file.push(part);
        }
        file.push(format!("{}.avi", stem));

        let out = map_output_path(source, &file, dest, "mkv");

        prop_assert!(out.starts_with(dest), "escaped: {}", out.display());
        prop_assert!(!out.components().any(|c| matches!(c, Component::ParentDir | Component::CurDir)));
    }
}
