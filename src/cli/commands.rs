//! Command definitions for the tagflow CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Streaming tag-protocol engine: inspect and apply tagged model output.
#[derive(Parser, Debug)]
#[command(name = "tagflow", version, about)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract operation records from a tagged document and print them as JSON
    Parse {
        /// Path to the tagged document
        file: PathBuf,
    },
    /// Parse a tagged document and apply its operations against a project root
    Apply {
        /// Path to the tagged document
        file: PathBuf,

        /// Project root the operations are applied inside
        #[arg(long)]
        root: PathBuf,

        /// Resolve and report without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },
}
