//! Metadata discovery from well-known paths.
//!
//! Method metadata is shipped as one TOML table per assembly. Tables are
//! looked up in `$XDG_DATA_HOME/hookbridge/metadata/` unless a directory is
//! given explicitly. Every `*.toml` file in the directory is loaded, in file
//! name order, and merged into a single [`MethodTable`].

use crate::error::MetadataResult;
use crate::metadata::MethodTable;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Get the default metadata directory.
pub fn metadata_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hookbridge")
        .map(|dirs| dirs.data_dir().join("metadata"))
}

/// Load and merge every metadata table in a directory.
///
/// Files that cannot be read or parsed are skipped with a warning. A missing
/// directory yields an empty table.
pub fn discover_metadata(dir: &Path) -> MetadataResult<MethodTable> {
    let mut table = MethodTable::new();

    if !dir.exists() {
        debug!("Metadata directory {:?} does not exist", dir);
        return Ok(table);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();

    for path in files {
        debug!("Loading metadata from {:?}", path);
        match MethodTable::from_file(&path) {
            Ok(loaded) => table.merge(loaded),
            Err(e) => warn!("Skipping metadata file {:?}: {}", path, e),
        }
    }

    info!(
        "Loaded {} methods across {} types from {:?}",
        table.len(),
        table.type_count(),
        dir
    );
    Ok(table)
}
