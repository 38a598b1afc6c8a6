//! Extension module descriptors
//!
//! An extension descriptor is the declarative record for one buildable
//! native module: its sources, per-toolchain compiler flags, include
//! paths, and link inputs. Descriptors are built once from the manifest
//! and consumed read-only during the build.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::defaults::{GPU_SOURCE_EXTENSION, SHARED_OBJECT_EXTENSION};

/// Toolchain identifier used to key compiler argument sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolchain {
    /// Host C/C++ compiler
    Host,
    /// GPU kernel compiler (nvcc)
    Gpu,
}

impl Toolchain {
    /// Classify a source file by its extension.
    ///
    /// `.cu` sources go to the GPU compiler; everything else goes to
    /// the host compiler.
    pub fn classify(source: &Path) -> Self {
        match source.extension() {
            Some(ext) if ext == GPU_SOURCE_EXTENSION => Self::Gpu,
            _ => Self::Host,
        }
    }

    /// The manifest key for this toolchain
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Gpu => "gpu",
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-toolchain compiler flag lists.
///
/// Each extension owns exactly one of these; the dispatch layer selects
/// one entry per compilation unit based on the unit's source type. An
/// absent entry is a configuration error surfaced at dispatch time, not
/// an empty flag list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompileArgs {
    /// Flags for host compilation units
    #[serde(default)]
    pub host: Option<Vec<String>>,

    /// Flags for GPU compilation units
    #[serde(default)]
    pub gpu: Option<Vec<String>>,
}

impl CompileArgs {
    /// Flag list for a toolchain, if configured
    pub fn get(&self, toolchain: Toolchain) -> Option<&[String]> {
        match toolchain {
            Toolchain::Host => self.host.as_deref(),
            Toolchain::Gpu => self.gpu.as_deref(),
        }
    }

    /// Argument set with a host entry only
    pub fn host_only(flags: Vec<String>) -> Self {
        Self {
            host: Some(flags),
            gpu: None,
        }
    }
}

/// Descriptor for one buildable native extension module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionDescriptor {
    /// Dotted module name (e.g. "utils.bbox_overlap")
    pub name: String,

    /// Ordered source file paths, relative to the project directory
    pub sources: Vec<PathBuf>,

    /// Extra include directories
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Libraries to link against (e.g. "cudart")
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Extra library search directories
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,

    /// Whether this extension is built. Disabled descriptors are
    /// retained in the manifest for future enablement.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-toolchain compiler flags. Keep this table last so the
    /// descriptor serializes as valid TOML (values before tables).
    #[serde(default)]
    pub args: CompileArgs,
}

fn default_enabled() -> bool {
    true
}

impl ExtensionDescriptor {
    /// Create a descriptor with defaults for everything but name and sources
    pub fn new(name: impl Into<String>, sources: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            sources,
            args: CompileArgs::default(),
            include_dirs: Vec::new(),
            libraries: Vec::new(),
            library_dirs: Vec::new(),
            enabled: true,
        }
    }

    /// Set the per-toolchain argument table
    #[must_use]
    pub fn with_args(mut self, args: CompileArgs) -> Self {
        self.args = args;
        self
    }

    /// Whether any source is a GPU kernel source
    pub fn has_gpu_sources(&self) -> bool {
        self.sources
            .iter()
            .any(|s| Toolchain::classify(s) == Toolchain::Gpu)
    }

    /// Output path of the linked module, relative to the output
    /// directory. Dots in the module name become path separators:
    /// "utils.nms.cpu_nms" -> "utils/nms/cpu_nms.so".
    pub fn output_rel_path(&self) -> PathBuf {
        let mut path: PathBuf = self.name.split('.').collect();
        path.set_extension(SHARED_OBJECT_EXTENSION);
        path
    }

    /// Intermediate object directory for this extension, relative to
    /// the shared object directory. Keeps same-named sources from
    /// different extensions apart.
    pub fn obj_rel_dir(&self) -> PathBuf {
        self.name.split('.').collect()
    }
}
