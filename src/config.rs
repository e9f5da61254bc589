//! Configuration file loading and option merging.
//!
//! Options come from three places, in decreasing precedence: command-line flags, a
//! `.postmanrc.json` file, and built-in defaults. [`GeneratorOptions::resolve`] performs the
//! merge once so the rest of the workflow sees a single, complete set of options.

use crate::collection::{DEFAULT_BASE_URL, DEFAULT_COLLECTION_NAME, DEFAULT_DESCRIPTION};
use crate::error::{Error, Result};
use crate::scanner::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_INCLUDE_PATTERNS};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".postmanrc.json";

const COLLECTION_FILE_SUFFIX: &str = ".postman_collection.json";

/// Contents of a `.postmanrc.json` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub project_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub collection_name: Option<String>,
    pub base_url: Option<String>,
    pub description: Option<String>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
}

/// Loads a config file.
///
/// # Errors
///
/// Returns [`Error::IoError`] if the file cannot be read and [`Error::ConfigError`] if it is
/// not valid JSON of the expected shape.
pub fn load_config(path: &Path) -> Result<Config> {
    debug!("Loading config from {}", path.display());
    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content).map_err(|e| Error::ConfigError {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Fully merged options for one generator run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub project_path: PathBuf,
    /// Explicit output path as given, not yet resolved against the project path
    pub output_path: Option<PathBuf>,
    pub collection_name: String,
    pub base_url: String,
    pub description: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl GeneratorOptions {
    /// Merges command-line overrides over `config`, falling back to the defaults.
    ///
    /// `overrides` uses the same optional shape as the config file; `None` fields mean the
    /// flag was not given. A missing project path defaults to `cwd`.
    pub fn resolve(overrides: Config, config: Config, cwd: &Path) -> Self {
        Self {
            project_path: overrides
                .project_path
                .or(config.project_path)
                .unwrap_or_else(|| cwd.to_path_buf()),
            output_path: overrides.output_path.or(config.output_path),
            collection_name: overrides
                .collection_name
                .or(config.collection_name)
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string()),
            base_url: overrides
                .base_url
                .or(config.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            description: overrides
                .description
                .or(config.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            include_patterns: overrides
                .include_patterns
                .or(config.include_patterns)
                .unwrap_or_else(|| owned(DEFAULT_INCLUDE_PATTERNS)),
            exclude_patterns: overrides
                .exclude_patterns
                .or(config.exclude_patterns)
                .unwrap_or_else(|| owned(DEFAULT_EXCLUDE_PATTERNS)),
        }
    }

    /// Where the collection file is written.
    ///
    /// An explicit output path is taken relative to the project path (absolute paths are
    /// kept). Otherwise the file is named after the collection, lower-cased with whitespace
    /// runs replaced by `-`, inside the project directory.
    pub fn output_file(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => self.project_path.join(path),
            None => self.project_path.join(collection_file_name(&self.collection_name)),
        }
    }
}

/// `Express API Collection` becomes `express-api-collection.postman_collection.json`.
pub fn collection_file_name(collection_name: &str) -> String {
    let mut slug = String::with_capacity(collection_name.len());
    let mut in_whitespace = false;
    for ch in collection_name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(ch);
            in_whitespace = false;
        }
    }
    slug.push_str(COLLECTION_FILE_SUFFIX);
    slug
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}
