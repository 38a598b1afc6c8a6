//! Default configuration values

/// Environment variable overriding the CUDA toolchain root
pub const CUDA_HOME_ENV: &str = "CUDAHOME";

/// Name of the GPU compiler executable
pub const NVCC_EXECUTABLE: &str = "nvcc";

/// Default host C compiler
pub const HOST_COMPILER: &str = "cc";

/// Environment variable overriding the host C compiler
pub const HOST_COMPILER_ENV: &str = "CC";

/// Manifest filename looked up in the project directory
pub const MANIFEST_FILENAME: &str = "cubuild.toml";

/// Default directory for linked extension modules
pub const DEFAULT_OUTPUT_DIR: &str = "build/lib";

/// Default directory for intermediate object files
pub const DEFAULT_OBJ_DIR: &str = "build/obj";

/// File extension of GPU kernel sources
pub const GPU_SOURCE_EXTENSION: &str = "cu";

/// File extension of linked extension modules
pub const SHARED_OBJECT_EXTENSION: &str = "so";
