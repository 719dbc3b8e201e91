//! A plain-text conversation log with keyword lookup.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An append-only memory file holding one `[role] content` line per
/// message.
#[derive(Clone, Debug)]
pub struct TextMemory {
    path: PathBuf,
}

impl TextMemory {
    /// Creates a memory stored at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the memory file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a message.
    ///
    /// Line breaks inside `content` are flattened to spaces so that every
    /// message stays on one line.
    pub fn append(&self, role: &str, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = format!("[{role}] {}\n", content.replace('\n', " "));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())
    }

    /// Returns the last `limit` lines containing `keyword`, joined by line
    /// breaks. A missing file yields an empty string.
    pub fn search(&self, keyword: &str, limit: usize) -> io::Result<String> {
        let content = match fs::read(&self.path) {
            Ok(content) => String::from_utf8_lossy(&content).into_owned(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(String::new());
            }
            Err(err) => return Err(err),
        };
        let matches: Vec<&str> = content
            .lines()
            .filter(|line| line.contains(keyword))
            .collect();
        let start = matches.len().saturating_sub(limit);
        Ok(matches[start..].join("\n"))
    }
}
