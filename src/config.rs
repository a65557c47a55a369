// Global configuration management

use crate::engine::{DEFAULT_INPUT_EXTENSIONS, RecognizedFormatSet, TargetFormat, TranscoderSettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the ffmpeg executable (bare name means PATH lookup)
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Audio codec used by the fast (video copy) strategy
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate used by the fast strategy
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Kill an attempt after this many seconds (unset = wait forever)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Extra arguments placed before the output path, shell-style quoting
    #[serde(default)]
    pub extra_args: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output container when none is given on the command line
    #[serde(default)]
    pub target_format: TargetFormat,

    /// File extensions picked up when scanning the source folder
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,

    /// Append run log lines to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_executable() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_input_extensions() -> Vec<String> {
    DEFAULT_INPUT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            timeout_secs: None,
            extra_args: String::new(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            target_format: TargetFormat::default(),
            input_extensions: default_input_extensions(),
            log_file: None,
        }
    }
}

impl TranscoderConfig {
    /// Turn the config section into invocation settings
    pub fn to_settings(&self) -> Result<TranscoderSettings> {
        let extra_args = if self.extra_args.trim().is_empty() {
            Vec::new()
        } else {
            // Use shlex for shell-style parsing (respects quotes)
            shlex::split(&self.extra_args)
                .with_context(|| format!("Invalid quoting in extra_args: {}", self.extra_args))?
        };

        Ok(TranscoderSettings {
            executable: self.executable.clone(),
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            extra_args,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl DefaultsConfig {
    pub fn formats(&self) -> RecognizedFormatSet {
        RecognizedFormatSet::new(&self.input_extensions)
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffmirror")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffmirror")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // Not being able to write the default is fine; built-ins still apply
            if let Err(e) = config.save() {
                tracing::warn!("Could not create default config file: {:#}", e);
                tracing::warn!(
                    "Using built-in defaults. Run 'ffmirror init-config' to create a config file."
                );
            }

            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }
}
