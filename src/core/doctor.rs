//! Doctor command logic
//!
//! Checks the compilers a build needs and reports issues with
//! suggestions.

use std::path::Path;

use crate::config::defaults::{CUDA_HOME_ENV, HOST_COMPILER, NVCC_EXECUTABLE};
use crate::core::manifest::Manifest;

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Add a configuration issue
    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Check if a command is available in PATH and extract its version
pub fn check_command_available(command: &str) -> Option<String> {
    std::process::Command::new(command)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = format!("{stdout}{stderr}");
                extract_version(&combined)
            } else {
                None
            }
        })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    // Patterns like "1.2.3" or "V12.4.131" (nvcc prints a leading V)
    let version_regex = regex::Regex::new(r"[vV]?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check host C compiler availability
pub fn check_host_compiler() -> CheckResult {
    match check_command_available(HOST_COMPILER) {
        Some(version) => CheckResult::pass("Host C compiler", Some(version), true),
        None => CheckResult::fail(
            "Host C compiler",
            "No working 'cc' found in PATH",
            Some("Install a C compiler (gcc or clang) or point $CC at one"),
            true,
        ),
    }
}

/// Check nvcc availability (optional; only GPU extensions need it)
pub fn check_nvcc() -> CheckResult {
    match check_command_available(NVCC_EXECUTABLE) {
        Some(version) => CheckResult::pass("CUDA compiler (nvcc)", Some(version), false),
        None => CheckResult::fail(
            "CUDA compiler (nvcc)",
            "nvcc not found in PATH",
            Some("Install the CUDA toolkit, add nvcc to your PATH, or set $CUDAHOME (only needed for GPU extensions)"),
            false,
        ),
    }
}

/// Check the CUDAHOME override, if set, actually points somewhere
pub fn check_cuda_home() -> Option<CheckResult> {
    let home = std::env::var_os(CUDA_HOME_ENV)?;
    let path = Path::new(&home);
    if path.exists() {
        Some(CheckResult::pass(
            "CUDAHOME override",
            Some(path.display().to_string()),
            false,
        ))
    } else {
        Some(CheckResult::fail(
            "CUDAHOME override",
            &format!("$CUDAHOME points at '{}', which does not exist", path.display()),
            Some("Fix or unset $CUDAHOME"),
            false,
        ))
    }
}

/// Check if the project manifest parses
pub fn check_project_config(project_dir: &Path) -> Vec<String> {
    let mut issues = Vec::new();
    let manifest_path = project_dir.join(crate::config::defaults::MANIFEST_FILENAME);

    if manifest_path.exists() {
        match std::fs::read_to_string(&manifest_path) {
            Ok(content) => {
                if let Err(e) = Manifest::from_toml(&content) {
                    issues.push(format!("Invalid manifest: {e}"));
                }
            }
            Err(e) => {
                issues.push(format!("Cannot read manifest: {e}"));
            }
        }
    }

    issues
}

/// Run all doctor checks
pub fn run_doctor(project_dir: Option<&Path>) -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_host_compiler());
    report.add_check(check_nvcc());
    if let Some(check) = check_cuda_home() {
        report.add_check(check);
    }

    if let Some(dir) = project_dir {
        for issue in check_project_config(dir) {
            report.add_config_issue(issue);
        }
    }

    report
}
