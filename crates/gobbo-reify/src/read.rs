//! The read collaborator used by `read` and `include` nodes.
//!
//! The core never touches a file system itself. Path policy (what an
//! absolute path is rooted at, what a relative path is relative to) belongs
//! to the [`Read`] implementation.

use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadInfo {
    /// The resolved path, which becomes the current file path of included
    /// content.
    pub absolute_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub path: String,
    pub message: String,
}

impl ReadError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot read '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for ReadError {}

/// Reads `path` on behalf of the file at `current_file_path`.
///
/// An empty `path` means the current file itself.
pub trait Read {
    fn read(&self, current_file_path: &str, path: &str) -> Result<ReadInfo, ReadError>;
}

impl<F> Read for F
where
    F: Fn(&str, &str) -> Result<ReadInfo, ReadError>,
{
    fn read(&self, current_file_path: &str, path: &str) -> Result<ReadInfo, ReadError> {
        self(current_file_path, path)
    }
}

/// Reads nothing: every path resolves to empty content at an empty path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRead;

impl Read for NullRead {
    fn read(&self, _current_file_path: &str, _path: &str) -> Result<ReadInfo, ReadError> {
        Ok(ReadInfo {
            absolute_path: String::new(),
            content: String::new(),
        })
    }
}

/// An in-memory file tree keyed by absolute, `/`-separated paths.
///
/// Absolute paths are looked up as given, relative paths are joined onto the
/// directory of the current file, and `.`/`..` segments are normalized.
#[derive(Debug, Clone, Default)]
pub struct MemoryRead {
    files: FxHashMap<String, String>,
}

impl MemoryRead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(normalize(&path.into()), content.into());
    }

    /// Resolves `path` as seen from `current_file_path`.
    pub fn resolve(current_file_path: &str, path: &str) -> String {
        if path.is_empty() {
            return normalize(current_file_path);
        }

        if path.starts_with('/') {
            return normalize(path);
        }

        let dir = match current_file_path.rfind('/') {
            Some(idx) => &current_file_path[..idx],
            None => "",
        };

        normalize(&format!("{}/{}", dir, path))
    }
}

impl Read for MemoryRead {
    fn read(&self, current_file_path: &str, path: &str) -> Result<ReadInfo, ReadError> {
        let absolute_path = Self::resolve(current_file_path, path);

        match self.files.get(&absolute_path) {
            Some(content) => Ok(ReadInfo {
                absolute_path,
                content: content.clone(),
            }),
            None => Err(ReadError::new(absolute_path, "no such file")),
        }
    }
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
