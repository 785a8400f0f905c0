//! Procom Process Communication Relay Library
//!
//! A small relay that connects a process's standard input/output to the
//! controlling terminal, named pipes (FIFOs), and a TCP socket, pumping
//! line-oriented data between whichever endpoints are active.

pub mod cli;
pub mod config;
pub mod endpoint;
pub mod relay;
pub mod transport;

use anyhow::Result;

/// Application result type for consistent error handling
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize tracing subscriber for logging
///
/// Events go to stderr; stdout belongs to the relay's data stream.
pub fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("procom={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
