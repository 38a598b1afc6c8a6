//! Per-unit compiler dispatch
//!
//! Wraps a single-toolchain compiler driver with a decision layer that
//! selects host or GPU compiler arguments for each compilation unit
//! before delegating to the driver's normal compile step. The wrapper
//! holds the driver by value (explicit injection) rather than rebinding
//! methods on a live compiler instance; everything unrelated to flag
//! selection (object naming, staleness checks, debug flag handling,
//! linking) is delegated to the driver unchanged.
//!
//! # Precondition
//!
//! The toolchain for a unit is resolved from the **first** source file
//! of the invocation. A unit must therefore contain sources for a
//! single toolchain; the build driver compiles one source file per
//! invocation. A mixed batch is rejected with
//! [`DispatchError::MixedToolchainSources`] instead of being
//! misclassified.

use std::path::{Path, PathBuf};

use crate::core::extension::{CompileArgs, Toolchain};
use crate::error::{CompileError, DispatchError};

/// One invocation of the underlying compile step.
///
/// `post_args` is the flat flag list the driver appends after the
/// source/output arguments; the dispatch layer substitutes it from the
/// per-toolchain argument table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
    /// Source files of this unit (nominally exactly one)
    pub sources: Vec<PathBuf>,
    /// Directory receiving the object files
    pub output_dir: PathBuf,
    /// Preprocessor macro definitions, with optional values
    pub macros: Vec<(String, Option<String>)>,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Whether to compile with debug info
    pub debug: bool,
    /// Flags inserted before the source/output arguments
    pub pre_args: Vec<String>,
    /// Flags appended after the source/output arguments
    pub post_args: Vec<String>,
    /// Files whose timestamps the unit depends on
    pub depends: Vec<PathBuf>,
}

/// The single-toolchain compile/link driver being wrapped.
pub trait BaseCompiler {
    /// Compile one unit, returning the produced object file paths.
    fn compile(&mut self, invocation: CompileInvocation) -> Result<Vec<PathBuf>, CompileError>;

    /// Link object files into one loadable shared object.
    fn link_shared(&mut self, request: LinkRequest) -> Result<PathBuf, CompileError>;
}

/// Inputs for linking a shared object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output path of the shared object
    pub output: PathBuf,
    /// Library search directories
    pub library_dirs: Vec<PathBuf>,
    /// Libraries to link against
    pub libraries: Vec<String>,
}

/// Compiler wrapper that routes each compilation unit's flags by
/// source type before delegating to the wrapped driver.
#[derive(Debug)]
pub struct DispatchingCompiler<C> {
    base: C,
}

impl<C: BaseCompiler> DispatchingCompiler<C> {
    /// Wrap a base compiler driver
    pub fn new(base: C) -> Self {
        Self { base }
    }

    /// Get the wrapped driver
    pub fn base(&self) -> &C {
        &self.base
    }

    /// Compile one unit, selecting the flag list keyed by the unit's
    /// toolchain from `post_args` and forwarding every other argument
    /// to the wrapped driver untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn compile(
        &mut self,
        sources: &[PathBuf],
        output_dir: &Path,
        macros: &[(String, Option<String>)],
        include_dirs: &[PathBuf],
        debug: bool,
        pre_args: &[String],
        post_args: &CompileArgs,
        depends: &[PathBuf],
    ) -> Result<Vec<PathBuf>, DispatchError> {
        let Some(first) = sources.first() else {
            // An empty unit compiles to nothing
            return Ok(Vec::new());
        };
        let toolchain = Toolchain::classify(first);

        for source in &sources[1..] {
            if Toolchain::classify(source) != toolchain {
                return Err(DispatchError::MixedToolchainSources {
                    first: first.clone(),
                    offending: source.clone(),
                });
            }
        }

        let flags = post_args.get(toolchain).ok_or_else(|| {
            DispatchError::MissingToolchainArgs {
                toolchain: toolchain.to_string(),
                source_file: first.clone(),
            }
        })?;

        tracing::debug!(
            "Dispatching {} unit: {}",
            toolchain,
            first.display()
        );

        let invocation = CompileInvocation {
            sources: sources.to_vec(),
            output_dir: output_dir.to_path_buf(),
            macros: macros.to_vec(),
            include_dirs: include_dirs.to_vec(),
            debug,
            pre_args: pre_args.to_vec(),
            post_args: flags.to_vec(),
            depends: depends.to_vec(),
        };

        Ok(self.base.compile(invocation)?)
    }

    /// Link objects into a shared object, delegated to the wrapped
    /// driver unchanged.
    pub fn link_shared(&mut self, request: LinkRequest) -> Result<PathBuf, DispatchError> {
        Ok(self.base.link_shared(request)?)
    }
}
