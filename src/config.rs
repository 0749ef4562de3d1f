//! Command-line configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::HashType;

/// Keep a replica directory identical to a source directory.
#[derive(Debug, Clone, Parser)]
#[command(name = "foldsync", version, about)]
pub struct Config {
    /// Directory treated as authoritative
    pub source: PathBuf,

    /// Directory kept in sync with the source
    pub replica: PathBuf,

    /// Seconds between full synchronization passes
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// File that log lines are appended to
    pub log_file: PathBuf,

    /// Content digest used to compare files (md5 or blake3)
    #[arg(long, default_value = "md5")]
    pub hash: HashType,

    /// Only run periodic passes; do not watch for changes
    #[arg(long)]
    pub no_watch: bool,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn watch(&self) -> bool {
        !self.no_watch
    }
}
