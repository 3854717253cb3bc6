use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use url::Url;

use crate::manifest::Manifest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory prefix the documents are mirrored under
    #[arg(short = 'P', long, value_name = "DIR")]
    pub directory_prefix: Option<PathBuf>,

    /// Origin the document paths are fetched from
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<Url>,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print where each document would be fetched from and saved to, then exit
    #[arg(long)]
    pub list: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

impl CliArgs {
    /// Applies the command line overrides on top of the built-in manifest.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::default();
        if let Some(ref prefix) = self.directory_prefix {
            manifest.output_dir = prefix.clone();
        }
        if let Some(ref base) = self.base_url {
            manifest.base_url = base.clone();
        }
        manifest
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
