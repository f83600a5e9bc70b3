//! CLI definitions for sas-analyze.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "sas-analyze",
    version,
    about = "Inspect the tokens, blocks and cursor zones of a SAS program",
    after_help = "Examples:\n  sas-analyze tokens report.sas\n  sas-analyze blocks report.sas --pretty\n  sas-analyze zone report.sas --line 3 --column 16"
)]
pub struct Cli {
    /// Analysis config file (defaults to sas-analysis.toml next to the program).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// JSON keyword catalog replacing the built-in one.
    #[arg(long, global = true, value_name = "FILE")]
    pub kb: Option<PathBuf>,
    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the classified tokens.
    Tokens {
        /// SAS program.
        file: PathBuf,
        /// Include blank tokens.
        #[arg(long)]
        blanks: bool,
    },
    /// Print the block outline.
    Blocks {
        /// SAS program.
        file: PathBuf,
    },
    /// Classify a cursor position.
    Zone {
        /// SAS program.
        file: PathBuf,
        /// Zero-based line.
        #[arg(long)]
        line: u32,
        /// Zero-based byte column.
        #[arg(long)]
        column: u32,
    },
}

impl Command {
    /// The program the command reads.
    pub fn file(&self) -> &Path {
        match self {
            Command::Tokens { file, .. } | Command::Blocks { file } | Command::Zone { file, .. } => {
                file
            }
        }
    }
}
