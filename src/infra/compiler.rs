//! Compiler process invocation
//!
//! The real single-toolchain driver behind the dispatch layer. Owns the
//! concerns the dispatch layer leaves alone: object file naming,
//! staleness checks against dependency timestamps, debug flag handling,
//! and running the actual compiler and linker processes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use crate::config::defaults::{HOST_COMPILER, HOST_COMPILER_ENV};
use crate::core::dispatch::{BaseCompiler, CompileInvocation, LinkRequest};
use crate::core::extension::Toolchain;
use crate::error::{CompileError, FilesystemError};
use crate::infra::cuda::CudaToolchain;

/// Compiler driver that shells out to the host C compiler and, when a
/// toolchain was located, to nvcc for GPU units.
#[derive(Debug)]
pub struct CmdCompiler {
    /// Host C compiler program
    host_cc: String,
    /// Located CUDA toolchain, if any
    cuda: Option<CudaToolchain>,
}

impl CmdCompiler {
    /// Create a driver using the `CC` environment variable or `cc`,
    /// with an optional CUDA toolchain for GPU units.
    pub fn new(cuda: Option<CudaToolchain>) -> Self {
        let host_cc = env::var(HOST_COMPILER_ENV).unwrap_or_else(|_| HOST_COMPILER.to_string());
        Self { host_cc, cuda }
    }

    /// Override the host compiler program
    #[must_use]
    pub fn with_host_compiler(mut self, program: impl Into<String>) -> Self {
        self.host_cc = program.into();
        self
    }

    /// Program used for a compilation unit of the given toolchain
    fn program_for(&self, toolchain: Toolchain, source: &Path) -> Result<String, CompileError> {
        match toolchain {
            Toolchain::Host => Ok(self.host_cc.clone()),
            Toolchain::Gpu => self
                .cuda
                .as_ref()
                .map(|cuda| cuda.nvcc().display().to_string())
                .ok_or_else(|| CompileError::MissingGpuToolchain {
                    source_file: source.to_path_buf(),
                }),
        }
    }
}

impl BaseCompiler for CmdCompiler {
    fn compile(&mut self, invocation: CompileInvocation) -> Result<Vec<PathBuf>, CompileError> {
        fs::create_dir_all(&invocation.output_dir).map_err(|e| FilesystemError::CreateDir {
            path: invocation.output_dir.clone(),
            error: e.to_string(),
        })?;

        let mut objects = Vec::with_capacity(invocation.sources.len());
        for source in &invocation.sources {
            let object = object_path(&invocation.output_dir, source);

            if is_up_to_date(&object, source, &invocation.depends) {
                tracing::debug!("{} is up to date, skipping", object.display());
                objects.push(object);
                continue;
            }

            let toolchain = Toolchain::classify(source);
            let program = self.program_for(toolchain, source)?;

            let mut cmd = Command::new(&program);
            for (name, value) in &invocation.macros {
                match value {
                    Some(value) => cmd.arg(format!("-D{name}={value}")),
                    None => cmd.arg(format!("-D{name}")),
                };
            }
            for dir in &invocation.include_dirs {
                cmd.arg("-I").arg(dir);
            }
            if invocation.debug {
                cmd.arg("-g");
            }
            // Extension objects end up in a shared object; host units
            // need position-independent code. GPU units carry their
            // equivalent via the descriptor's own gpu flags.
            #[cfg(unix)]
            if toolchain == Toolchain::Host {
                cmd.arg("-fPIC");
            }
            cmd.args(&invocation.pre_args);
            cmd.arg("-c").arg(source).arg("-o").arg(&object);
            cmd.args(&invocation.post_args);

            tracing::info!("Compiling {} with {}", source.display(), program);
            run_checked(cmd, &program, source)?;
            objects.push(object);
        }
        Ok(objects)
    }

    fn link_shared(&mut self, request: LinkRequest) -> Result<PathBuf, CompileError> {
        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent).map_err(|e| FilesystemError::CreateDir {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        let mut cmd = Command::new(&self.host_cc);
        cmd.arg("-shared");
        cmd.args(&request.objects);
        cmd.arg("-o").arg(&request.output);
        for dir in &request.library_dirs {
            cmd.arg("-L").arg(dir);
        }
        for library in &request.libraries {
            cmd.arg(format!("-l{library}"));
        }

        tracing::info!("Linking {}", request.output.display());
        let output = cmd.output().map_err(|e| CompileError::Spawn {
            program: self.host_cc.clone(),
            error: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(CompileError::LinkFailed {
                program: self.host_cc.clone(),
                output: request.output,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(request.output)
    }
}

/// Object file path for a source: `<output_dir>/<stem>.o`
fn object_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    output_dir.join(stem).with_extension("o")
}

/// Whether an object is newer than its source and every dependency.
/// Any unreadable timestamp makes the unit stale.
fn is_up_to_date(object: &Path, source: &Path, depends: &[PathBuf]) -> bool {
    let Some(object_time) = mtime(object) else {
        return false;
    };
    let Some(source_time) = mtime(source) else {
        return false;
    };
    if source_time >= object_time {
        return false;
    }
    depends
        .iter()
        .all(|dep| mtime(dep).is_some_and(|t| t < object_time))
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn run_checked(mut cmd: Command, program: &str, source: &Path) -> Result<(), CompileError> {
    let output = cmd.output().map_err(|e| CompileError::Spawn {
        program: program.to_string(),
        error: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(CompileError::CommandFailed {
            program: program.to_string(),
            source_file: source.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
