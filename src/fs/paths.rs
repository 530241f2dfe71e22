//! Path and directory management.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::api::Creator;
use crate::config::Config;
use crate::error::Result;
use crate::fs::naming::{numbered_filename, sanitize_path_component};

/// Get the base folder for a creator's downloads.
pub fn get_creator_folder(config: &Config, creator: &Creator) -> Result<PathBuf> {
    let folder = sanitize_path_component(&creator.user_name)?;
    Ok(config.download_directory().join(folder))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Place `filenames` in `dir`, renaming repeats so every path is distinct.
///
/// The first occurrence keeps its name; later ones get `_1`, `_2`, ...
/// before the extension. Comparison ignores case so the result is also safe
/// on case-insensitive filesystems. Existing files on disk are not consulted:
/// a file already present is a partial or finished earlier download of the
/// same post.
pub fn assign_unique_paths(dir: &Path, filenames: &[String]) -> Vec<PathBuf> {
    let mut used: HashSet<String> = HashSet::with_capacity(filenames.len());
    let mut paths = Vec::with_capacity(filenames.len());

    for filename in filenames {
        let mut candidate = filename.clone();
        let mut counter = 1;
        while !used.insert(candidate.to_lowercase()) {
            candidate = numbered_filename(filename, counter);
            counter += 1;
        }
        paths.push(dir.join(candidate));
    }

    paths
}
