//! Clean logic
//!
//! Removes the build artifact directories.

use std::path::Path;

use crate::error::FilesystemError;

/// Directories to remove during clean
pub const CLEAN_DIRECTORIES: &[&str] = &["build"];

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<String>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Clean build artifacts from a project
pub fn clean_project(project_path: &Path) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    for dir_name in CLEAN_DIRECTORIES {
        let dir_path = project_path.join(dir_name);

        if dir_path.exists() {
            std::fs::remove_dir_all(&dir_path).map_err(|e| FilesystemError::RemoveDir {
                path: dir_path.clone(),
                error: e.to_string(),
            })?;
            result.removed.push((*dir_name).to_string());
        } else {
            result.skipped.push((*dir_name).to_string());
        }
    }

    Ok(result)
}
