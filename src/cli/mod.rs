//! CLI command definitions for inittree
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod load;

use clap::{Parser, Subcommand};
use load::LoadArgs;
use std::path::PathBuf;

/// Load and inspect directory-driven YAML configuration trees
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to an inittree settings file
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr, or filename (overrides settings)
    #[arg(short, long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a configuration tree and print it
    Load(LoadArgs),

    /// Bootstrap the full application and report what was declared
    Check(LoadArgs),
}
