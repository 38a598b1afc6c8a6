//! CUDA toolchain discovery
//!
//! Locates the CUDA installation on the host and validates its layout.
//!
//! # Overview
//!
//! Host sources are compiled with the system C compiler, which needs no
//! discovery. GPU kernel sources need the CUDA toolchain, whose root is
//! found in one of two ways:
//!
//! - The `CUDAHOME` environment variable, taken verbatim as the root
//! - Searching the executable search path for `nvcc`, first match wins
//!
//! The root is assumed to follow the standard layout:
//!
//! ```text
//! <root>/bin/nvcc
//! <root>/include/
//! <root>/lib64/          (Linux; lib/x64 on Windows)
//! ```
//!
//! Discovery runs once per build process, before any compilation
//! starts, and the resulting descriptor is immutable.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::defaults::{CUDA_HOME_ENV, NVCC_EXECUTABLE};
use crate::error::ToolchainError;

/// A located and validated CUDA toolchain.
///
/// Every path is known to exist at construction time; a descriptor is
/// never returned partially valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CudaToolchain {
    /// Toolchain root directory
    home: PathBuf,
    /// Path to the nvcc executable
    nvcc: PathBuf,
    /// Header directory (`<root>/include`)
    include: PathBuf,
    /// Platform library directory
    lib: PathBuf,
}

impl CudaToolchain {
    /// Get the toolchain root directory
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the path to the nvcc executable
    pub fn nvcc(&self) -> &Path {
        &self.nvcc
    }

    /// Get the header directory
    pub fn include(&self) -> &Path {
        &self.include
    }

    /// Get the platform library directory
    pub fn lib(&self) -> &Path {
        &self.lib
    }

    /// Check that every derived path exists, in field order, so the
    /// first missing path reported is deterministic.
    fn validate(&self) -> Result<(), ToolchainError> {
        let fields: [(&str, &Path); 4] = [
            ("home", &self.home),
            ("nvcc", &self.nvcc),
            ("include", &self.include),
            ("lib", &self.lib),
        ];
        for (field, path) in fields {
            if !path.exists() {
                return Err(ToolchainError::PathInvalid {
                    field: field.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// Platform library directory under the toolchain root
fn cuda_lib_dir(home: &Path) -> PathBuf {
    if cfg!(windows) {
        home.join("lib").join("x64")
    } else {
        home.join("lib64")
    }
}

/// Locate the CUDA toolchain on this host.
///
/// Starts with the `CUDAHOME` environment variable; if unset, searches
/// `PATH` for `nvcc`. Re-probes the filesystem on every call (callers
/// invoke this once per build process).
///
/// # Errors
///
/// Returns an error if:
/// - No override is set and `nvcc` is nowhere on the search path
/// - Any derived path (root, nvcc, include, lib) does not exist
pub fn locate() -> Result<CudaToolchain, ToolchainError> {
    locate_with(env::var_os(CUDA_HOME_ENV), env::var_os("PATH"))
}

/// Discovery with explicit inputs, so tests can probe fake layouts
/// without touching the process environment.
pub(crate) fn locate_with(
    home_override: Option<OsString>,
    search_path: Option<OsString>,
) -> Result<CudaToolchain, ToolchainError> {
    let (home, nvcc) = match home_override {
        // The override is trusted as the root directly; no search.
        Some(home) => {
            let home = PathBuf::from(home);
            let nvcc = home.join("bin").join(NVCC_EXECUTABLE);
            (home, nvcc)
        }
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let nvcc = which::which_in(NVCC_EXECUTABLE, search_path, cwd).map_err(|_| {
                ToolchainError::NotFound {
                    executable: NVCC_EXECUTABLE.to_string(),
                    env_var: CUDA_HOME_ENV.to_string(),
                }
            })?;
            tracing::info!("nvcc path is {}", nvcc.display());
            // Root is the parent-of-parent of <root>/bin/nvcc
            let home = nvcc
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .ok_or_else(|| ToolchainError::PathInvalid {
                    field: "home".to_string(),
                    path: nvcc.clone(),
                })?;
            (home, nvcc)
        }
    };

    let toolchain = CudaToolchain {
        include: home.join("include"),
        lib: cuda_lib_dir(&home),
        home,
        nvcc,
    };
    toolchain.validate()?;
    Ok(toolchain)
}
