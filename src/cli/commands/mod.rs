//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build_ext;
pub mod check;
pub mod clean;
pub mod doctor;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build all enabled extension modules
    BuildExt {
        /// Path to the manifest (defaults to ./cubuild.toml)
        #[arg(short, long, env = "CUBUILD_MANIFEST")]
        manifest: Option<PathBuf>,

        /// Compile with debug info
        #[arg(long)]
        debug: bool,
    },

    /// Validate configuration without building
    Check {
        /// Path to the manifest (defaults to ./cubuild.toml)
        #[arg(short, long, env = "CUBUILD_MANIFEST")]
        manifest: Option<PathBuf>,
    },

    /// Remove build artifacts
    Clean,

    /// Check system dependencies
    Doctor,
}

impl Commands {
    /// Execute the command
    pub fn run(self) -> Result<()> {
        match self {
            Self::BuildExt { manifest, debug } => {
                let current_dir = std::env::current_dir()?;
                build_ext::execute(&current_dir, manifest, debug)
            }
            Self::Check { manifest } => {
                let current_dir = std::env::current_dir()?;
                check::execute(&current_dir, manifest)
            }
            Self::Clean => {
                let current_dir = std::env::current_dir()?;
                clean::execute(&current_dir)
            }
            Self::Doctor => {
                let current_dir = std::env::current_dir().ok();
                doctor::execute(current_dir.as_deref())
            }
        }
    }
}
