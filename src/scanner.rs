use crate::error::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Glob patterns selecting source files when none are configured.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["**/*.js"];

/// Glob patterns excluding files when none are configured.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["node_modules/**", "test/**", "tests/**"];

/// Directory never descended into, whatever the patterns say.
const DEPENDENCY_DIRECTORY: &str = "node_modules";

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks a project directory and keeps every file matched by
/// at least one include pattern and by no exclude pattern. Patterns use gitignore syntax and
/// are relative to the root: `**/*.js` matches at any depth, `test/**` only under the
/// top-level `test` directory, and a leading `!` negates a pattern.
///
/// Hidden directories (those starting with `.`) and `node_modules` are never entered.
/// Files are returned in a stable order, sorted by name within each directory.
///
/// # Example
///
/// ```no_run
/// use postman_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-express-app"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Result of directory scanning operation.
///
/// Contains the list of discovered source files and any warnings encountered during scanning.
#[derive(Debug)]
pub struct ScanResult {
    /// Paths of all selected files, in walk order
    pub source_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory, using the default
    /// include and exclude patterns.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            include: to_owned(DEFAULT_INCLUDE_PATTERNS),
            exclude: to_owned(DEFAULT_EXCLUDE_PATTERNS),
        }
    }

    /// Replaces the include and exclude patterns.
    pub fn with_patterns(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include = include;
        self.exclude = exclude;
        self
    }

    /// Scans the directory tree and collects the selected files.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::error::Error::InvalidArgument) if a pattern
    /// is not a valid glob.
    pub fn scan(&self) -> Result<ScanResult> {
        let include = self.matcher(&self.include)?;
        let exclude = self.matcher(&self.exclude)?;

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != DEPENDENCY_DIRECTORY
            });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let path = entry.path();
                    if self.is_selected(path, &include, &exclude) {
                        source_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Selected {} files under {}",
            source_files.len(),
            self.root_path.display()
        );
        Ok(ScanResult {
            source_files,
            warnings,
        })
    }

    fn matcher(&self, patterns: &[String]) -> Result<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root_path);
        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }
        Ok(builder.build()?)
    }

    /// A positive pattern match is reported by `Gitignore` as "ignore"; negated patterns
    /// report as "whitelist".
    fn is_selected(&self, path: &Path, include: &Gitignore, exclude: &Gitignore) -> bool {
        include.matched(path, false).is_ignore()
            && !exclude.matched_path_or_any_parents(path, false).is_ignore()
    }
}

fn to_owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}
