//! Build orchestration
//!
//! Drives the build of every enabled extension: per-source compilation
//! through the dispatch layer, then linking into a loadable shared
//! object. The locator result is computed before the builder is
//! constructed and stays frozen for the whole build.
//!
//! The build is fail-fast: the first failed compilation unit aborts
//! everything, and partial builds are never reported as success.

use std::path::{Path, PathBuf};

use crate::core::dispatch::{BaseCompiler, DispatchingCompiler, LinkRequest};
use crate::core::extension::ExtensionDescriptor;
use crate::core::manifest::{BuildConfig, Manifest};
use crate::error::BuildError;
use crate::infra::cuda::CudaToolchain;

/// One successfully built extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltExtension {
    /// Extension name
    pub name: String,
    /// Number of compilation units
    pub units: usize,
    /// Path of the linked shared object
    pub output: PathBuf,
}

/// Summary of a whole build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Extensions built, in manifest order
    pub built: Vec<BuiltExtension>,
    /// Names of disabled extensions that were skipped
    pub skipped: Vec<String>,
}

/// Build driver over a dispatching compiler and a frozen toolchain
/// descriptor.
#[derive(Debug)]
pub struct Builder<C> {
    compiler: DispatchingCompiler<C>,
    cuda: Option<CudaToolchain>,
}

impl<C: BaseCompiler> Builder<C> {
    /// Create a builder. `cuda` must already be located (and is never
    /// re-probed) when any enabled extension has GPU sources.
    pub fn new(base: C, cuda: Option<CudaToolchain>) -> Self {
        Self {
            compiler: DispatchingCompiler::new(base),
            cuda,
        }
    }

    /// Build every enabled extension of the manifest, in order.
    pub fn build(
        &mut self,
        manifest: &Manifest,
        project_dir: &Path,
    ) -> Result<BuildReport, BuildError> {
        let mut report = BuildReport::default();
        for ext in &manifest.extensions {
            if !ext.enabled {
                tracing::info!("Extension {} is disabled, skipping", ext.name);
                report.skipped.push(ext.name.clone());
                continue;
            }
            let built = self.build_extension(ext, &manifest.build, project_dir)?;
            report.built.push(built);
        }
        Ok(report)
    }

    /// Build one extension: compile each source as its own unit, then
    /// link the objects into `<output_dir>/<name as path>.so`.
    pub fn build_extension(
        &mut self,
        ext: &ExtensionDescriptor,
        build: &BuildConfig,
        project_dir: &Path,
    ) -> Result<BuiltExtension, BuildError> {
        let cuda = if ext.has_gpu_sources() {
            Some(self.cuda.as_ref().ok_or_else(|| {
                BuildError::GpuToolchainRequired {
                    extension: ext.name.clone(),
                }
            })?)
        } else {
            None
        };

        let mut include_dirs = ext.include_dirs.clone();
        let mut library_dirs = ext.library_dirs.clone();
        if let Some(cuda) = cuda {
            include_dirs.push(cuda.include().to_path_buf());
            library_dirs.push(cuda.lib().to_path_buf());
        }

        let obj_dir = project_dir.join(&build.obj_dir).join(ext.obj_rel_dir());
        tracing::info!("Building extension: {}", ext.name);

        // One source file per invocation; the dispatch layer resolves
        // the toolchain from the unit's single source.
        let mut objects = Vec::with_capacity(ext.sources.len());
        for source in &ext.sources {
            let unit = [project_dir.join(source)];
            let mut compiled = self.compiler.compile(
                &unit,
                &obj_dir,
                &[],
                &include_dirs,
                build.debug,
                &[],
                &ext.args,
                &[],
            )?;
            objects.append(&mut compiled);
        }

        let output = project_dir
            .join(&build.output_dir)
            .join(ext.output_rel_path());
        let units = objects.len();
        let output = self.compiler.link_shared(LinkRequest {
            objects,
            output,
            library_dirs,
            libraries: ext.libraries.clone(),
        })?;

        tracing::info!("Built extension: {}", ext.name);
        Ok(BuiltExtension {
            name: ext.name.clone(),
            units,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatch::CompileInvocation;
    use crate::core::manifest::Manifest;
    use crate::error::{CompileError, DispatchError};

    /// Base compiler that records invocations instead of compiling
    #[derive(Debug, Default)]
    struct RecordingCompiler {
        invocations: Vec<CompileInvocation>,
        links: Vec<LinkRequest>,
    }

    impl BaseCompiler for RecordingCompiler {
        fn compile(
            &mut self,
            invocation: CompileInvocation,
        ) -> Result<Vec<PathBuf>, CompileError> {
            let objects = invocation
                .sources
                .iter()
                .map(|s| invocation.output_dir.join(s.with_extension("o")))
                .collect();
            self.invocations.push(invocation);
            Ok(objects)
        }

        fn link_shared(&mut self, request: LinkRequest) -> Result<PathBuf, CompileError> {
            let output = request.output.clone();
            self.links.push(request);
            Ok(output)
        }
    }

    fn fake_cuda_toolchain(root: &Path) -> CudaToolchain {
        use std::fs;
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::write(root.join("bin/nvcc"), "").unwrap();
        if cfg!(windows) {
            fs::create_dir_all(root.join("lib/x64")).unwrap();
        } else {
            fs::create_dir_all(root.join("lib64")).unwrap();
        }
        crate::infra::cuda::locate_with(Some(root.as_os_str().to_os_string()), None).unwrap()
    }

    fn host_manifest() -> Manifest {
        Manifest::from_toml(
            r#"
[project]
name = "m"

[[extension]]
name = "m.a"
sources = ["a.c", "b.c"]
[extension.args]
host = ["-O2"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_each_source_is_its_own_unit() {
        let manifest = host_manifest();
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let report = builder.build(&manifest, Path::new("/proj")).unwrap();

        assert_eq!(report.built.len(), 1);
        assert_eq!(report.built[0].units, 2);
        let invocations = &builder.compiler.base().invocations;
        assert_eq!(invocations.len(), 2);
        assert!(invocations.iter().all(|inv| inv.sources.len() == 1));
    }

    #[test]
    fn test_disabled_extensions_are_skipped() {
        let manifest = Manifest::reference();
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let report = builder.build(&manifest, Path::new("/proj")).unwrap();

        assert_eq!(report.built.len(), 2);
        assert_eq!(report.skipped, vec!["utils.nms.gpu_nms".to_string()]);
    }

    #[test]
    fn test_gpu_extension_without_toolchain_fails_before_compiling() {
        let mut manifest = Manifest::reference();
        manifest.extensions[2].enabled = true;
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let err = builder.build(&manifest, Path::new("/proj")).unwrap_err();

        assert!(matches!(
            err,
            BuildError::GpuToolchainRequired { ref extension }
                if extension == "utils.nms.gpu_nms"
        ));
        // The two host extensions built before the GPU one failed
        let invocations = &builder.compiler.base().invocations;
        assert_eq!(invocations.len(), 2);
    }

    #[test]
    fn test_gpu_extension_gets_toolchain_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let cuda = fake_cuda_toolchain(dir.path());
        let cuda_include = cuda.include().to_path_buf();
        let cuda_lib = cuda.lib().to_path_buf();

        let mut manifest = Manifest::reference();
        manifest.extensions[2].enabled = true;
        let mut builder = Builder::new(RecordingCompiler::default(), Some(cuda));

        let report = builder.build(&manifest, Path::new("/proj")).unwrap();

        assert_eq!(report.built.len(), 3);
        let base = builder.compiler.base();
        // GPU units and their host companions see the toolchain include dir
        let gpu_invocations: Vec<_> = base
            .invocations
            .iter()
            .filter(|inv| inv.include_dirs.contains(&cuda_include))
            .collect();
        assert_eq!(gpu_invocations.len(), 2);
        // The GPU module links against the toolchain lib dir and cudart
        let gpu_link = base.links.last().unwrap();
        assert!(gpu_link.library_dirs.contains(&cuda_lib));
        assert!(gpu_link.libraries.contains(&"cudart".to_string()));
    }

    #[test]
    fn test_missing_args_abort_the_build() {
        let manifest = Manifest::from_toml(
            r#"
[project]
name = "m"

[[extension]]
name = "m.k"
sources = ["k.cu"]
[extension.args]
host = []
"#,
        )
        .unwrap();
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let err = builder.build(&manifest, Path::new("/proj")).unwrap_err();

        assert!(matches!(
            err,
            BuildError::GpuToolchainRequired { .. } | BuildError::Dispatch(_)
        ));
        assert!(builder.compiler.base().invocations.is_empty());
    }

    #[test]
    fn test_missing_host_args_surface_as_dispatch_error() {
        let manifest = Manifest::from_toml(
            r#"
[project]
name = "m"

[[extension]]
name = "m.a"
sources = ["a.c"]
[extension.args]
gpu = ["-arch=sm_35"]
"#,
        )
        .unwrap();
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let err = builder.build(&manifest, Path::new("/proj")).unwrap_err();

        assert!(matches!(
            err,
            BuildError::Dispatch(DispatchError::MissingToolchainArgs { ref toolchain, .. })
                if toolchain == "host"
        ));
    }

    #[test]
    fn test_output_path_mirrors_dotted_name() {
        let manifest = Manifest::reference();
        let mut builder = Builder::new(RecordingCompiler::default(), None);

        let report = builder.build(&manifest, Path::new("/proj")).unwrap();

        assert_eq!(
            report.built[1].output,
            Path::new("/proj/build/lib/utils/nms/cpu_nms.so")
        );
    }

}
