//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status prefixes, and formatted messages to the user.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicU8 = AtomicU8::new(0);

/// Global output configuration derived from the CLI flags
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// Suppress all output except errors
    pub quiet: bool,
    /// Emit JSON for scripting
    pub json: bool,
    /// Verbosity level (0 = warnings only)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Publish this configuration for the process
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
        VERBOSE.store(self.verbose, Ordering::Relaxed);
    }
}

/// Whether quiet mode is active
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether JSON output mode is active
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Print an informational message unless quiet/JSON mode is active
pub fn print_info(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{message}");
    }
}

/// Print a success message unless quiet/JSON mode is active
pub fn print_success(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print a warning message unless quiet/JSON mode is active
pub fn print_warning(message: &str) {
    if !is_quiet() && !is_json() {
        println!("{} {message}", status::WARNING);
    }
}

/// Print an indented detail line unless quiet/JSON mode is active
pub fn print_detail(message: &str) {
    if !is_quiet() && !is_json() {
        println!("    {message}");
    }
}

/// Display a top-level error to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("    caused by: {cause}");
    }
}

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    if is_quiet() || is_json() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} extensions ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
