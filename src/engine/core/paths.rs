use std::path::{Component, Path, PathBuf};

/// Compute where a discovered file lands in the destination tree.
///
/// The file's folder relative to `source_root` is recreated under `dest_root`
/// and the extension is swapped for `target_ext`. Only plain folder names are
/// carried over, so the result never escapes `dest_root`; files that are not
/// under `source_root` at all land directly in `dest_root`.
pub fn map_output_path(
    source_root: &Path,
    file_path: &Path,
    dest_root: &Path,
    target_ext: &str,
) -> PathBuf {
    let mut output = dest_root.to_path_buf();
    output.push(relative_dir(source_root, file_path));

    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".into());
    let ext = target_ext.trim_start_matches('.');

    output.push(format!("{}.{}", stem, ext));
    output
}

/// Folder part of `file_path` relative to `source_root`, normal components only
pub fn relative_dir(source_root: &Path, file_path: &Path) -> PathBuf {
    file_path
        .parent()
        .and_then(|p| p.strip_prefix(source_root).ok())
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
