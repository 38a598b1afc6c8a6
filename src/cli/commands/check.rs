//! CLI command for `cubuild check`
//!
//! Validates the manifest and reports what would be built.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::cli::output::{is_json, print_detail, print_info, print_success, print_warning};
use crate::config::defaults::MANIFEST_FILENAME;
use crate::core::check::check;
use crate::core::manifest::Manifest;

/// Execute the check command
pub fn execute(project_dir: &Path, manifest_path: Option<PathBuf>) -> Result<()> {
    let manifest_path =
        manifest_path.unwrap_or_else(|| project_dir.join(MANIFEST_FILENAME));
    let manifest = Manifest::load(&manifest_path)?;

    let report = check(&manifest);

    if is_json() {
        let json_result = serde_json::json!({
            "status": if report.is_buildable() { "success" } else { "error" },
            "to_build": report.to_build,
            "disabled": report.disabled,
            "gpu_required": report.gpu_required,
            "gpu_toolchain_found": report.gpu_toolchain_found,
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&json_result).unwrap_or_default());
    } else {
        print_info(&format!(
            "Manifest OK: {} extension(s) to build",
            report.to_build.len()
        ));
        for name in &report.to_build {
            print_detail(name);
        }
        if !report.disabled.is_empty() {
            print_detail(&format!("disabled: {}", report.disabled.join(", ")));
        }
        for warning in &report.warnings {
            print_warning(warning);
        }
        if report.is_buildable() {
            print_success("Configuration is buildable");
        }
    }

    if !report.is_buildable() {
        bail!("GPU extensions are enabled but no CUDA toolchain was located");
    }
    Ok(())
}
