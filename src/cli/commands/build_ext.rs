//! Build-ext command implementation
//!
//! Implements `cubuild build-ext`: locate the CUDA toolchain when the
//! manifest needs it, then compile and link every enabled extension.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::output::{create_build_bar, is_json, print_success};
use crate::config::defaults::MANIFEST_FILENAME;
use crate::core::builder::{BuildReport, Builder};
use crate::core::manifest::Manifest;
use crate::infra::compiler::CmdCompiler;
use crate::infra::cuda;

/// Execute the build-ext command
pub fn execute(project_dir: &Path, manifest_path: Option<PathBuf>, debug: bool) -> Result<()> {
    let manifest_path =
        manifest_path.unwrap_or_else(|| project_dir.join(MANIFEST_FILENAME));
    let mut manifest = Manifest::load(&manifest_path)?;
    if debug {
        manifest.build.debug = true;
    }

    tracing::info!("Building project: {}", manifest.project.name);

    // Locate once, before any compilation, and only when an enabled
    // extension actually has GPU sources. The result stays frozen for
    // the whole build.
    let cuda = if manifest.needs_gpu_toolchain() {
        let toolchain = cuda::locate()?;
        tracing::info!("CUDA toolchain at {}", toolchain.home().display());
        Some(toolchain)
    } else {
        None
    };

    let mut builder = Builder::new(CmdCompiler::new(cuda.clone()), cuda);
    let mut report = BuildReport::default();

    let enabled_count = manifest.enabled_extensions().count();
    let bar = create_build_bar(enabled_count as u64);
    for ext in &manifest.extensions {
        if !ext.enabled {
            report.skipped.push(ext.name.clone());
            continue;
        }
        bar.set_message(ext.name.clone());
        let built = builder
            .build_extension(ext, &manifest.build, project_dir)
            .with_context(|| format!("Failed to build extension '{}'", ext.name))?;
        report.built.push(built);
        bar.inc(1);
    }
    bar.finish_and_clear();

    if is_json() {
        let json_result = serde_json::json!({
            "status": "success",
            "built": report.built.iter().map(|b| serde_json::json!({
                "name": b.name,
                "units": b.units,
                "output": b.output,
            })).collect::<Vec<_>>(),
            "skipped": report.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&json_result).unwrap_or_default());
        return Ok(());
    }

    print_success("Build complete!");
    for built in &report.built {
        crate::cli::output::print_detail(&format!(
            "{} ({} units) -> {}",
            built.name,
            built.units,
            built.output.display()
        ));
    }
    if !report.skipped.is_empty() {
        crate::cli::output::print_detail(&format!(
            "skipped (disabled): {}",
            report.skipped.join(", ")
        ));
    }

    Ok(())
}
