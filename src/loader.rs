//! File access used while resolving imports and handlers.
//!
//! Analysis never touches the file system directly. Everything goes through a
//! [`SourceLoader`], so the same code runs over a real project ([`FsLoader`]) or over an
//! in-memory set of `(path, source)` pairs ([`MemoryLoader`]).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Existence check and read access to source files.
pub trait SourceLoader {
    /// Returns true if `path` names a readable source file.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the full text of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Loader backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Loader over an in-memory set of files.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    /// Builder-style variant of [`MemoryLoader::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory source for {}", path.display()),
            )
        })
    }
}
