#![allow(clippy::module_name_repetitions)]
//! Data file discovery.
//!
//! The dashboard may be launched from the workspace root, from a package
//! directory, or from an installed location, so input files are found by
//! probing a fixed list of candidate locations.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the workspace `data/` directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the ordered list of locations probed for `file_name`.
#[must_use]
pub fn candidate_paths(file_name: &str) -> Vec<PathBuf> {
    vec![
        Path::new("src/data").join(file_name),
        Path::new("data").join(file_name),
        Path::new("../data").join(file_name),
        data_dir().join(file_name),
        project_root().join("src").join("data").join(file_name),
    ]
}

/// Returns the path used when no candidate exists.
#[must_use]
pub fn default_path(file_name: &str) -> PathBuf {
    Path::new("src/data").join(file_name)
}

/// Resolves the location of a data file.
///
/// The first existing candidate from [`candidate_paths`] wins. When none
/// exists the [`default_path`] is returned anyway, so the subsequent open
/// reports the missing file.
#[must_use]
pub fn resolve_data_file(file_name: &str) -> PathBuf {
    first_existing(&candidate_paths(file_name)).unwrap_or_else(|| {
        let fallback = default_path(file_name);
        log::warn!(
            "{file_name} not found in any known location, using default path {}",
            fallback.display()
        );
        fallback
    })
}

/// Returns `configured` if set, otherwise searches for `file_name`.
#[must_use]
pub fn configured_or_resolved(configured: Option<&Path>, file_name: &str) -> PathBuf {
    configured.map_or_else(|| resolve_data_file(file_name), Path::to_path_buf)
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|p| p.exists()).cloned();
    if let Some(path) = &found {
        log::info!("Found data file at {}", path.display());
    }
    found
}
