//! Command line configuration for the gunrock server.
use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;

/// Scheduling label for first-in first-out dispatch, the only policy implemented.
pub const FIFO: &str = "FIFO";

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct ServerOptions {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,
    /// Number of worker threads
    #[arg(short, long, default_value = "1")]
    pub threads: NonZeroUsize,
    /// Capacity of the pending connection queue
    #[arg(short, long, default_value = "1")]
    pub buffers: NonZeroUsize,
    /// Directory to serve files from
    #[arg(short = 'd', long, default_value = "static")]
    pub base_dir: PathBuf,
    /// Scheduling algorithm for queued connections
    #[arg(short, long, default_value = FIFO)]
    pub schedalg: String,
    /// Write logs to this file instead of stderr
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,
}

impl ServerOptions {
    pub fn is_fifo(&self) -> bool {
        self.schedalg.eq_ignore_ascii_case(FIFO)
    }
}
