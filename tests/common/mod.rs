//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a host C compiler is available for end-to-end compile tests
#[allow(dead_code)]
pub fn host_cc_available() -> bool {
    std::process::Command::new("cc")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Sample manifest with a single host-compiled extension
#[allow(dead_code)]
pub const HOST_MANIFEST: &str = r#"
[project]
name = "demo"

[[extension]]
name = "demo.native"
sources = ["native/impl.c"]
[extension.args]
host = ["-O2"]
"#;

/// Sample manifest with an enabled GPU extension
#[allow(dead_code)]
pub const GPU_MANIFEST: &str = r#"
[project]
name = "demo"

[[extension]]
name = "demo.kernel"
sources = ["native/kernel.cu"]
libraries = ["cudart"]
[extension.args]
host = []
gpu = ["-arch=sm_35"]
"#;

/// A trivial C source that compiles anywhere
#[allow(dead_code)]
pub const TRIVIAL_C: &str = "int demo_answer(void) { return 42; }\n";
