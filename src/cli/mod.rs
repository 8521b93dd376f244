//! Command-line interface for bbfs.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{read_config, ConfigError};
use crate::fs::{FsError, RepoFs};

pub use args::{GlobalArgs, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Everything a bbfs command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Output could not be written.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Filesystem or remote error.
    #[error("{0}")]
    Fs(#[from] FsError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// bbfs - browse a Bitbucket Server repository like a directory tree.
#[derive(Parser, Debug)]
#[command(name = "bbfs", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the repository's tags.
    Tags(commands::repo::TagsArgs),

    /// List commits, or show one.
    Commits(commands::repo::CommitsArgs),

    /// List a directory.
    Ls(commands::files::LsArgs),

    /// Describe a file or directory.
    Stat(commands::files::StatArgs),

    /// Stream a file's raw content.
    Cat(commands::files::CatArgs),

    /// Fetch a file's content through the line-oriented API.
    Content(commands::files::ContentArgs),
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse `std::env::args`, exiting with usage on error.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let result = read_config(&self.global.to_config_source())?;
        for warning in &result.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::debug!(
            base_url = %result.config.base_url(),
            project = %result.config.repository.project_key,
            repo = %result.config.repository.slug,
            "configuration loaded"
        );

        let fs = RepoFs::new(&result.config)?;

        match self.command {
            Command::Tags(args) => args.run(&fs, &self.global).await,
            Command::Commits(args) => args.run(&fs, &self.global).await,
            Command::Ls(args) => args.run(&fs, &self.global).await,
            Command::Stat(args) => args.run(&fs, &self.global).await,
            Command::Cat(args) => args.run(&fs, &self.global).await,
            Command::Content(args) => args.run(&fs, &self.global).await,
        }
    }
}
