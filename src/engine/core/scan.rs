use super::error::DiscoveryError;
use super::formats::RecognizedFormatSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Make sure the root exists, is a folder and can be listed
fn check_root(root: &Path) -> Result<(), DiscoveryError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DiscoveryError::NotFound(root.to_path_buf()),
        _ => DiscoveryError::Unreadable {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    fs::read_dir(root).map_err(|e| DiscoveryError::Unreadable {
        path: root.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Scan a directory recursively and invoke a callback for each recognized file.
/// Entries are visited in file-name order so results are stable across runs.
pub fn discover_streaming<F>(
    root: &Path,
    formats: &RecognizedFormatSet,
    mut on_file: F,
) -> Result<(), DiscoveryError>
where
    F: FnMut(PathBuf),
{
    check_root(root)?;

    // Links stay unfollowed: a loop back into the tree would never finish
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        // Symlinked files count, their target just has to be a regular file
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && formats.matches(entry.path()) {
            on_file(entry.into_path());
        }
    }

    Ok(())
}

/// Scan a directory recursively for recognized video files
pub fn discover(root: &Path, formats: &RecognizedFormatSet) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    discover_streaming(root, formats, |path| files.push(path))?;
    tracing::debug!("Discovered {} file(s) under {}", files.len(), root.display());
    Ok(files)
}
