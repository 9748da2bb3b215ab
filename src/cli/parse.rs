//! CLI parse: clap types for WarrenT. No behavior; definitions only.

use crate::types::Language;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// WarrenT CLI - a gated, model-driven startup course
#[derive(Parser)]
#[command(name = "warrent")]
#[command(about = "Turn a startup idea into a staged course and a business plan")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where warrent.toml and exported plans live)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (layered above the workspace config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Course language (en, zh); overrides course.default_language
    #[arg(long)]
    pub language: Option<Language>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes the file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive course for a startup idea
    Start {
        /// The startup idea, e.g. "meal kits for university students"
        idea: String,
    },
    /// Configuration commands (show, validate)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the resolved configuration
    Validate,
}
