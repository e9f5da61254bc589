//! Serialization of collections to JSON and writing them to disk.

use crate::collection::Collection;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a collection to pretty-printed JSON.
///
/// Two-space indentation is used, matching what Postman itself writes on export.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```no_run
/// use postman_from_source::collection::CollectionBuilder;
/// use postman_from_source::serializer::serialize_json;
///
/// let collection = CollectionBuilder::new().build();
/// let json = serialize_json(&collection).unwrap();
/// println!("{}", json);
/// ```
pub fn serialize_json(collection: &Collection) -> Result<String> {
    debug!("Serializing collection to JSON");
    serde_json::to_string_pretty(collection).context("Failed to serialize collection to JSON")
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does. Missing parent
/// directories are created.
///
/// # Arguments
///
/// * `content` - The string content to write
/// * `path` - The file path to write to
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
