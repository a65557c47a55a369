use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Check that the transcoder can be executed and return its version line
pub fn transcoder_version(executable: &Path) -> Result<String> {
    let output = Command::new(executable)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {}. Is ffmpeg installed and in PATH?",
                executable.display()
            )
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "{} -version failed with status: {}",
            executable.display(),
            output.status
        );
    }

    Ok(first_version_line(&String::from_utf8_lossy(&output.stdout)))
}

/// First non-empty line of `-version` output
pub fn first_version_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Unknown version")
        .to_string()
}
