//! Command Line Interface module
//!
//! Implements the CLI flags and argument parsing for Procom.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "procom")]
#[command(about = "procom - process communication")]
#[command(long_about = "A line-oriented relay between the terminal, named pipes and TCP sockets")]
#[command(version)]
pub struct Cli {
    /// Stdin FIFO path
    #[arg(short = 'i', long = "stdin-fifo", value_name = "PATH")]
    pub stdin_fifo: Option<String>,

    /// Stdout FIFO path
    #[arg(short = 'o', long = "stdout-fifo", value_name = "PATH")]
    pub stdout_fifo: Option<String>,

    /// Network address
    #[arg(short, long)]
    pub address: Option<String>,

    /// Network port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Open the stdout FIFO before the stdin FIFO
    #[arg(short, long)]
    pub reverse: bool,

    /// Print debug messages
    #[arg(short, long)]
    pub debug: bool,

    /// Configuration file path
    #[arg(long, default_value = "procom.toml")]
    pub config_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Dry-run mode: resolve and print the route plan without opening endpoints
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Adjust log level based on the debug flag
    pub fn effective_log_level(&self) -> String {
        if self.debug {
            "debug".to_string()
        } else {
            self.log_level.clone()
        }
    }

    /// Check whether a socket endpoint was requested on the command line
    pub fn socket_requested(&self) -> bool {
        self.address.is_some() || self.port.is_some()
    }

    /// Check if we're running in dry-run mode
    pub fn is_dry_run_mode(&self) -> bool {
        self.dry_run
    }
}
