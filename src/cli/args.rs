//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Manga scan downloader and CBZ packer.
#[derive(Parser, Debug)]
#[command(
    name = "scan-archiver",
    version,
    about = "Download manga scans and pack them into CBZ archives",
    long_about = "A CLI tool to search a manga catalog, download chapter scans with resumable \
                  progress, split overly tall pages and pack titles into CBZ archives.\n\n\
                  Per-run values (title, chapters, page height) are asked interactively."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Directory holding downloaded scans.
    #[arg(short = 's', long = "scans-dir", global = true, env = "SCAN_ARCHIVER_SCANS_DIR")]
    pub scans_directory: Option<PathBuf>,

    /// Directory receiving split pages and CBZ archives.
    #[arg(short = 'o', long = "output-dir", global = true)]
    pub output_directory: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search a title and download its scans (default).
    Download,
    /// Split and pack a downloaded title into CBZ archives.
    Pack,
    /// Sweep the catalog and print every title as JSON.
    Catalog {
        /// Print display names instead of slugs.
        #[arg(long)]
        names: bool,

        /// Add two-letter syllables to the sweep terms.
        #[arg(long)]
        thorough: bool,
    },
}

impl Args {
    /// The subcommand to run, `download` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Download)
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.scans_directory {
            config.scans.scans_directory = dir.clone();
        }

        if let Some(dir) = &self.output_directory {
            config.pack.output_directory = dir.clone();
        }
    }
}
