//! Error types for cubuild
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// CUDA toolchain discovery errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// The GPU compiler could not be found anywhere on the search path
    #[error("The '{executable}' binary could not be located in your PATH. Either add it to your PATH, or set ${env_var}")]
    NotFound { executable: String, env_var: String },

    /// A derived toolchain path does not exist on disk
    #[error("The CUDA {field} path could not be located in {path}")]
    PathInvalid { field: String, path: PathBuf },
}

/// Compiler dispatch errors
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The extension descriptor has no flag list for the toolchain
    /// selected by the compilation unit's source type
    #[error("No '{toolchain}' compiler arguments configured for '{source_file}'. Add a '{toolchain}' entry to the extension's args table")]
    MissingToolchainArgs { toolchain: String, source_file: PathBuf },

    /// A compilation unit batched sources for more than one toolchain
    #[error("Compilation unit mixes host and gpu sources ('{first}' and '{offending}'): one source file per invocation is required")]
    MixedToolchainSources { first: PathBuf, offending: PathBuf },

    /// The underlying compiler failed
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Compiler driver errors
#[derive(Error, Debug)]
pub enum CompileError {
    /// The compiler process could not be started
    #[error("Failed to run compiler '{program}': {error}")]
    Spawn { program: String, error: String },

    /// The compiler exited with a non-zero status
    #[error("Compiler '{program}' failed for '{source_file}':\n{stderr}")]
    CommandFailed {
        program: String,
        source_file: PathBuf,
        stderr: String,
    },

    /// The linker exited with a non-zero status
    #[error("Linker '{program}' failed for '{output}':\n{stderr}")]
    LinkFailed {
        program: String,
        output: PathBuf,
        stderr: String,
    },

    /// A GPU source was compiled without a located CUDA toolchain
    #[error("No CUDA toolchain available to compile '{source_file}'. Add nvcc to your PATH or set $CUDAHOME")]
    MissingGpuToolchain { source_file: PathBuf },

    /// Filesystem error during compilation
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Build orchestration errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// An enabled extension needs the GPU toolchain but none was located
    #[error("Extension '{extension}' contains GPU sources but no CUDA toolchain was located")]
    GpuToolchainRequired { extension: String },

    /// Dispatch or compile failure for one compilation unit
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Filesystem error during the build
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Manifest (cubuild.toml) errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'. Create a cubuild.toml describing your extension modules")]
    NotFound { path: PathBuf },

    /// Manifest could not be read
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Manifest parse error
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// Project name is empty
    #[error("Project name must not be empty")]
    EmptyProjectName,

    /// Two extensions share the same name
    #[error("Duplicate extension name '{name}'")]
    DuplicateExtension { name: String },

    /// An extension has no source files
    #[error("Extension '{extension}' has no source files")]
    NoSources { extension: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },
}

/// Top-level cubuild error type
#[derive(Error, Debug)]
pub enum CubuildError {
    /// Toolchain discovery error
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Dispatch error
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Compile error
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// IO error
    #[error("IO error: {source}")]
    Io { source: std::io::Error },
}
