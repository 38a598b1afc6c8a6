//! Check command logic
//!
//! Validates the manifest and reports what would be built, without
//! compiling anything.

use crate::core::manifest::Manifest;
use crate::infra::cuda;

/// Result of the check operation
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Extensions that would be built, in order
    pub to_build: Vec<String>,
    /// Disabled extensions
    pub disabled: Vec<String>,
    /// Whether any enabled extension needs the GPU toolchain
    pub gpu_required: bool,
    /// Whether the GPU toolchain was located (only probed when needed)
    pub gpu_toolchain_found: bool,
    /// Warnings encountered during check
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Whether a build would be able to start
    pub fn is_buildable(&self) -> bool {
        !self.gpu_required || self.gpu_toolchain_found
    }
}

/// Inspect a manifest and report what a build would do.
pub fn check(manifest: &Manifest) -> CheckReport {
    let mut report = CheckReport::default();

    for ext in &manifest.extensions {
        if ext.enabled {
            report.to_build.push(ext.name.clone());
        } else {
            report.disabled.push(ext.name.clone());
        }
    }

    report.gpu_required = manifest.needs_gpu_toolchain();
    if report.gpu_required {
        match cuda::locate() {
            Ok(toolchain) => {
                report.gpu_toolchain_found = true;
                tracing::debug!("CUDA toolchain at {}", toolchain.home().display());
            }
            Err(e) => {
                report.warnings.push(e.to_string());
            }
        }
    }

    for ext in manifest.enabled_extensions() {
        if ext.has_gpu_sources() && ext.args.gpu.is_none() {
            report.warnings.push(format!(
                "Extension '{}' has GPU sources but no 'gpu' args entry; the build will fail at dispatch",
                ext.name
            ));
        }
    }

    report
}
