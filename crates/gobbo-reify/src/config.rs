//! Resolution limits for the reifier.
//!
//! [`Config`] bounds how deep `include` nodes may nest and whether a file
//! that (transitively) includes itself is reported. Use
//! [`Config::default()`] for the usual limits.
//!
//! # Config file: `.gobborc`
//!
//! Embedders may keep the settings in a TOML file:
//!
//! ```toml
//! # .gobborc example
//! max_include_depth = 16
//! detect_include_cycles = true
//! ```
//!
//! All fields are optional; missing ones keep their defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".gobborc";

/// TOML-friendly intermediate representation (all fields optional).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    max_include_depth: Option<usize>,
    detect_include_cycles: Option<bool>,
}

/// # Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | `max_include_depth` | `64` |
/// | `detect_include_cycles` | `true` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many `include` nodes may be nested inside each other.
    pub max_include_depth: usize,
    /// Report a file that includes one of the files currently being
    /// included instead of recursing until the depth limit.
    pub detect_include_cycles: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_include_depth: 64,
            detect_include_cycles: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches for `.gobborc` starting from `start_dir` and walking up.
    ///
    /// Returns `Config::default()` if no config file is found.
    pub fn load(start_dir: impl AsRef<Path>) -> Result<Self> {
        match Self::find_config(start_dir) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(toml_str).context("Failed to parse config")?;

        let defaults = Self::default();
        Ok(Self {
            max_include_depth: file.max_include_depth.unwrap_or(defaults.max_include_depth),
            detect_include_cycles: file
                .detect_include_cycles
                .unwrap_or(defaults.detect_include_cycles),
        })
    }

    fn find_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let mut dir = start_dir.as_ref().to_path_buf();

        if let Ok(abs) = dir.canonicalize() {
            dir = abs;
        }

        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !dir.pop() {
                return None;
            }
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_include_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_include_cycles = enabled;
        self
    }
}
