//! CLI command for `cubuild clean`
//!
//! Removes build artifacts.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::print_success;
use crate::core::clean::clean_project;

/// Execute the clean command
pub fn execute(project_dir: &Path) -> Result<()> {
    let result = clean_project(project_dir)?;

    if result.removed.is_empty() {
        print_success("Nothing to clean");
    } else {
        print_success(&format!("Removed: {}", result.removed.join(", ")));
    }
    Ok(())
}
