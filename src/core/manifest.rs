//! Manifest (cubuild.toml) parsing and validation
//!
//! The manifest is the declarative input surface of a build: a project
//! header, build directories, and the table of extension modules with
//! their sources and per-toolchain flags.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::{DEFAULT_OBJ_DIR, DEFAULT_OUTPUT_DIR};
use crate::core::extension::{CompileArgs, ExtensionDescriptor};
use crate::error::ManifestError;

/// The main project manifest (cubuild.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Project configuration
    pub project: ProjectConfig,

    /// Build configuration
    #[serde(default)]
    pub build: BuildConfig,

    /// Extension module descriptors, in build order
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionDescriptor>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Project description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Directory for linked extension modules
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for intermediate object files
    #[serde(default = "default_obj_dir")]
    pub obj_dir: PathBuf,

    /// Compile with debug info
    #[serde(default)]
    pub debug: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_obj_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OBJ_DIR)
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            obj_dir: default_obj_dir(),
            debug: false,
        }
    }
}

impl Manifest {
    /// Parse and validate a manifest from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Shape validation: non-empty project name, unique extension
    /// names, non-empty source lists. Per-toolchain argument coverage
    /// is deliberately not checked here; a missing entry for a
    /// toolchain a source actually uses is surfaced at dispatch time.
    fn validate(&self) -> Result<(), ManifestError> {
        if self.project.name.trim().is_empty() {
            return Err(ManifestError::EmptyProjectName);
        }
        let mut seen = HashSet::new();
        for ext in &self.extensions {
            if !seen.insert(ext.name.as_str()) {
                return Err(ManifestError::DuplicateExtension {
                    name: ext.name.clone(),
                });
            }
            if ext.sources.is_empty() {
                return Err(ManifestError::NoSources {
                    extension: ext.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Extensions that will actually be built
    pub fn enabled_extensions(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.extensions.iter().filter(|e| e.enabled)
    }

    /// Whether any enabled extension needs the GPU toolchain
    pub fn needs_gpu_toolchain(&self) -> bool {
        self.enabled_extensions().any(ExtensionDescriptor::has_gpu_sources)
    }

    /// The reference manifest: the bounding-box and NMS extension
    /// table this tool was grown around. Two host-compiled modules,
    /// plus a disabled GPU module kept for future enablement.
    pub fn reference() -> Self {
        let bbox = ExtensionDescriptor {
            include_dirs: vec![PathBuf::from("third_party/numpy/include")],
            ..ExtensionDescriptor::new(
                "utils.bbox_overlap",
                vec![PathBuf::from("utils/bbox.c")],
            )
            .with_args(CompileArgs::host_only(vec![]))
        };
        let cpu_nms = ExtensionDescriptor {
            include_dirs: vec![PathBuf::from("third_party/numpy/include")],
            ..ExtensionDescriptor::new(
                "utils.nms.cpu_nms",
                vec![PathBuf::from("utils/nms/cpu_nms.c")],
            )
            .with_args(CompileArgs::host_only(vec![]))
        };
        let gpu_nms = ExtensionDescriptor {
            include_dirs: vec![PathBuf::from("third_party/numpy/include")],
            libraries: vec!["cudart".to_string()],
            enabled: false,
            ..ExtensionDescriptor::new(
                "utils.nms.gpu_nms",
                vec![
                    PathBuf::from("utils/nms/gpu_nms.c"),
                    PathBuf::from("utils/nms/nms_kernel.cu"),
                ],
            )
            .with_args(CompileArgs {
                host: Some(vec![]),
                gpu: Some(vec![
                    "-arch=sm_35".to_string(),
                    "--ptxas-options=-v".to_string(),
                ]),
            })
        };

        Self {
            project: ProjectConfig {
                name: "utils".to_string(),
                version: default_version(),
                description: None,
            },
            build: BuildConfig::default(),
            extensions: vec![bbox, cpu_nms, gpu_nms],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[project]
name = "utils"

[build]
debug = true

[[extension]]
name = "utils.bbox_overlap"
sources = ["utils/bbox.c"]
include_dirs = ["third_party/numpy/include"]
[extension.args]
host = ["-O2"]

[[extension]]
name = "utils.nms.gpu_nms"
enabled = false
sources = ["utils/nms/gpu_nms.c", "utils/nms/nms_kernel.cu"]
libraries = ["cudart"]
[extension.args]
host = []
gpu = ["-arch=sm_35", "--ptxas-options=-v"]
"#;

    #[test]
    fn test_parse_sample_manifest() {
        let manifest = Manifest::from_toml(SAMPLE).unwrap();

        assert_eq!(manifest.project.name, "utils");
        assert!(manifest.build.debug);
        assert_eq!(manifest.extensions.len(), 2);

        let bbox = &manifest.extensions[0];
        assert_eq!(bbox.name, "utils.bbox_overlap");
        assert!(bbox.enabled);
        assert_eq!(bbox.args.host, Some(vec!["-O2".to_string()]));
        assert_eq!(bbox.args.gpu, None);

        let gpu_nms = &manifest.extensions[1];
        assert!(!gpu_nms.enabled);
        assert_eq!(gpu_nms.libraries, vec!["cudart".to_string()]);
        assert_eq!(
            gpu_nms.args.gpu,
            Some(vec![
                "-arch=sm_35".to_string(),
                "--ptxas-options=-v".to_string()
            ])
        );
    }

    #[test]
    fn test_build_defaults() {
        let manifest = Manifest::from_toml("[project]\nname = \"m\"\n").unwrap();

        assert_eq!(manifest.build.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(manifest.build.obj_dir, PathBuf::from(DEFAULT_OBJ_DIR));
        assert!(!manifest.build.debug);
        assert!(manifest.extensions.is_empty());
    }

    #[test]
    fn test_empty_project_name_rejected() {
        let err = Manifest::from_toml("[project]\nname = \"  \"\n").unwrap_err();
        assert!(matches!(err, ManifestError::EmptyProjectName));
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let toml = r#"
[project]
name = "m"

[[extension]]
name = "a"
sources = ["a.c"]

[[extension]]
name = "a"
sources = ["b.c"]
"#;
        let err = Manifest::from_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::DuplicateExtension { ref name } if name == "a"
        ));
    }

    #[test]
    fn test_extension_without_sources_rejected() {
        let toml = r#"
[project]
name = "m"

[[extension]]
name = "a"
sources = []
"#;
        let err = Manifest::from_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::NoSources { ref extension } if extension == "a"
        ));
    }

    #[test]
    fn test_enabled_extensions_skip_disabled() {
        let manifest = Manifest::from_toml(SAMPLE).unwrap();
        let enabled: Vec<&str> = manifest
            .enabled_extensions()
            .map(|e| e.name.as_str())
            .collect();

        assert_eq!(enabled, vec!["utils.bbox_overlap"]);
    }

    #[test]
    fn test_gpu_need_follows_enablement() {
        let mut manifest = Manifest::from_toml(SAMPLE).unwrap();
        // Only a disabled extension has GPU sources
        assert!(!manifest.needs_gpu_toolchain());

        manifest.extensions[1].enabled = true;
        assert!(manifest.needs_gpu_toolchain());
    }

    #[test]
    fn test_reference_manifest_shape() {
        let manifest = Manifest::reference();

        // Two buildable host modules, one disabled GPU module
        let enabled: Vec<_> = manifest.enabled_extensions().collect();
        assert_eq!(enabled.len(), 2);
        assert!(enabled.iter().all(|e| !e.has_gpu_sources()));

        let gpu = manifest
            .extensions
            .iter()
            .find(|e| e.name == "utils.nms.gpu_nms")
            .unwrap();
        assert!(!gpu.enabled);
        assert!(gpu.has_gpu_sources());
        assert!(gpu.args.gpu.is_some());
    }

    #[test]
    fn test_reference_manifest_roundtrips() {
        let manifest = Manifest::reference();
        let toml = toml::to_string(&manifest).unwrap();
        let parsed = Manifest::from_toml(&toml).unwrap();

        assert_eq!(parsed, manifest);
    }
}
