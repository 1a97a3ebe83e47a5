//! CLI module for rustible-tags
//!
//! This module provides the command-line interface, including argument
//! parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rustible-tags - inspect which tasks a tag selection runs
///
/// Evaluates `--tags` and `--skip-tags` against a playbook without executing
/// anything.
#[derive(Parser, Debug, Clone)]
#[command(name = "rustible-tags")]
#[command(author = "Rustible Contributors")]
#[command(version)]
#[command(about = "Inspect which tasks a tag selection runs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Only run plays and tasks tagged with these values (comma separated)
    #[arg(short = 't', long, global = true, action = clap::ArgAction::Append)]
    pub tags: Vec<String>,

    /// Only run plays and tasks whose tags do not match these values
    #[arg(long, global = true, action = clap::ArgAction::Append)]
    pub skip_tags: Vec<String>,

    /// Extra variables (key=value or @file.yml)
    #[arg(short = 'e', long = "extra-vars", global = true, action = clap::ArgAction::Append)]
    pub extra_vars: Vec<String>,

    /// Verbosity level (-v, -vv, -vvv, -vvvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show the difference between configured and effective tag filters
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Decide tasks on their own tags only, ignoring play and block tags
    #[arg(long, global = true)]
    pub no_inherit: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the tasks of a playbook with their tags
    #[command(name = "list-tasks")]
    ListTasks(commands::list_tasks::ListTasksArgs),

    /// List every tag declared in a playbook
    #[command(name = "list-tags")]
    ListTags(commands::list_tags::ListTagsArgs),

    /// Decide whether a unit with the given tags runs
    Check(commands::check::CheckArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-4)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(4)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}
