use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Input extensions recognized out of the box
pub const DEFAULT_INPUT_EXTENSIONS: &[&str] = &[
    // common
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm",
    // mpeg
    "mpg", "mpeg", "m2v",
    // mobile
    "3gp", "3g2",
    // broadcast / camcorder
    "ts", "mts", "m2ts",
    // dvd
    "vob",
    // professional / open
    "mxf", "ogv", "ogg",
    // misc
    "rmvb", "asf", "divx", "f4v",
];

/// Case-insensitive set of file extensions that discovery picks up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedFormatSet {
    extensions: BTreeSet<String>,
}

impl RecognizedFormatSet {
    /// Build a set from extensions given with or without a leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn contains_extension(&self, ext: &str) -> bool {
        self.extensions.contains(&normalize_extension(ext))
    }

    /// Check whether a path carries one of the recognized extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for RecognizedFormatSet {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_EXTENSIONS)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Container the batch is converted into
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Mp4,
    Mkv,
    Mov,
    Avi,
    Webm,
    Flv,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Mp4,
        TargetFormat::Mkv,
        TargetFormat::Mov,
        TargetFormat::Avi,
        TargetFormat::Webm,
        TargetFormat::Flv,
    ];

    /// Output file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Mp4 => "mp4",
            TargetFormat::Mkv => "mkv",
            TargetFormat::Mov => "mov",
            TargetFormat::Avi => "avi",
            TargetFormat::Webm => "webm",
            TargetFormat::Flv => "flv",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_extension(s);
        TargetFormat::ALL
            .into_iter()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| {
                format!(
                    "unsupported target format '{}' (expected one of: {})",
                    s,
                    TargetFormat::ALL.map(|f| f.extension()).join(", ")
                )
            })
    }
}
