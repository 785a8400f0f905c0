//! Session manager for relay session lifecycle management
//!
//! Builds the immutable session snapshot, opens the endpoint set, starts
//! both pumps, waits for them to stop, and tears everything down.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::endpoint::EndpointSet;

use super::coordinator::{Coordinator, SessionStatus};
use super::pump::{BoxedReader, BoxedWriter, Pump, PumpDirection, PumpOutcome};
use super::route::{Route, RoutePlan, Sink, Source, Topology};

/// Socket endpoint parameters for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    pub address: String,
    pub port: u16,
}

/// Immutable endpoint snapshot for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub fifo_in: Option<PathBuf>,
    pub fifo_out: Option<PathBuf>,
    pub socket: Option<SocketConfig>,
    pub reverse_fifo_open: bool,
}

impl SessionConfig {
    /// Build the session snapshot from CLI flags and file configuration
    ///
    /// CLI values override file values. Networking is enabled when an
    /// address or a port was given on the command line; the file only
    /// supplies defaults for whichever half is missing.
    pub fn from_sources(cli: &Cli, config: &Config) -> Self {
        let fifo_in = cli
            .stdin_fifo
            .clone()
            .or_else(|| config.stdin_fifo.clone())
            .map(PathBuf::from);
        let fifo_out = cli
            .stdout_fifo
            .clone()
            .or_else(|| config.stdout_fifo.clone())
            .map(PathBuf::from);

        let socket = cli.socket_requested().then(|| SocketConfig {
            address: cli.address.clone().unwrap_or_else(|| config.address.clone()),
            port: cli.port.unwrap_or(config.port),
        });

        Self {
            fifo_in,
            fifo_out,
            socket,
            reverse_fifo_open: cli.reverse || config.reverse_fifo_open,
        }
    }

    /// Which endpoint kinds this session will open
    pub fn topology(&self) -> Topology {
        Topology {
            fifo_in: self.fifo_in.is_some(),
            fifo_out: self.fifo_out.is_some(),
            socket: self.socket.is_some(),
        }
    }
}

/// Session state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

/// Final report for a completed session
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    pub status: SessionStatus,
    pub inbound: PumpOutcome,
    pub outbound: Option<PumpOutcome>,
}

/// Drives one relay session from endpoint open to teardown
pub struct SessionManager {
    config: SessionConfig,
    plan: RoutePlan,
    state: SessionState,
    endpoints: EndpointSet,
    coordinator: Arc<Coordinator>,
}

impl SessionManager {
    /// Create a new SessionManager
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let session_config = SessionConfig::from_sources(cli, config);
        let plan = RoutePlan::resolve(session_config.topology());

        info!("Session route plan: {:?}", plan);

        Self {
            config: session_config,
            plan,
            state: SessionState::Starting,
            endpoints: EndpointSet::default(),
            coordinator: Arc::new(Coordinator::new()),
        }
    }

    pub fn plan(&self) -> &RoutePlan {
        &self.plan
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Open every configured endpoint
    ///
    /// Fatal on failure: endpoints already opened in the same sequence
    /// are closed before the error is returned and no pump is started.
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Opening session endpoints");

        self.endpoints = EndpointSet::open(&self.config, &self.plan)
            .await
            .context("Failed to open session endpoints")?;

        if let Some(role) = self.endpoints.socket_role() {
            info!("Socket endpoint ready ({:?} role)", role);
        }

        self.state = SessionState::Running;
        info!("Session endpoints open");

        Ok(())
    }

    /// Run both pumps until they stop, then tear down
    ///
    /// Blocks until every started pump has reached a stopped state. A
    /// keyboard interrupt raises both termination signals and the
    /// session proceeds to teardown once the pumps unblock.
    pub async fn run(&mut self) -> Result<SessionReport> {
        let interrupt_watcher = {
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Keyboard interrupt");
                        coordinator.interrupt();
                    }
                    Err(e) => error!("Failed to listen for interrupt: {}", e),
                }
            })
        };

        let inbound = self.spawn_pump(PumpDirection::Inbound, self.plan.inbound)?;
        let outbound = match self.plan.outbound {
            Some(route) => Some(self.spawn_pump(PumpDirection::Outbound, route)?),
            None => None,
        };

        let inbound_outcome = join_pump(PumpDirection::Inbound, inbound).await;
        let outbound_outcome = match outbound {
            Some(handle) => Some(join_pump(PumpDirection::Outbound, handle).await),
            None => None,
        };

        interrupt_watcher.abort();

        debug!(
            "Pump outcomes: inbound {:?}, outbound {:?}",
            inbound_outcome, outbound_outcome
        );

        self.shutdown().await;

        Ok(SessionReport {
            status: self.coordinator.status(),
            inbound: inbound_outcome,
            outbound: outbound_outcome,
        })
    }

    /// Close every endpoint that is still open
    pub async fn shutdown(&mut self) {
        info!("Initiating session teardown");
        self.state = SessionState::ShuttingDown;

        self.endpoints.teardown().await;

        self.state = SessionState::Terminated;
        info!("Session teardown completed");
    }

    fn spawn_pump(&mut self, direction: PumpDirection, route: Route) -> Result<JoinHandle<PumpOutcome>> {
        let reader = self.bind_source(route.source)?;
        let writer = self.bind_sink(route.sink)?;

        let pump = Pump::new(direction, route, reader, writer, self.coordinator.token(direction));
        let coordinator = self.coordinator.clone();

        self.coordinator.start(direction);

        Ok(tokio::spawn(async move {
            let outcome = pump.run().await;
            coordinator.finish(direction, outcome);
            outcome
        }))
    }

    fn bind_source(&mut self, source: Source) -> Result<BoxedReader> {
        match source {
            Source::Stdin => Ok(Box::new(tokio::io::stdin())),
            Source::FifoIn => self
                .endpoints
                .take_fifo_in()
                .map(|file| Box::new(file) as BoxedReader)
                .context("Stdin FIFO is not open for reading"),
            Source::Socket => self
                .endpoints
                .take_socket_reader()
                .map(|half| Box::new(half) as BoxedReader)
                .context("Socket is not open for reading"),
        }
    }

    fn bind_sink(&mut self, sink: Sink) -> Result<BoxedWriter> {
        match sink {
            Sink::Stdout => Ok(Box::new(tokio::io::stdout())),
            Sink::FifoIn => self
                .endpoints
                .take_fifo_in()
                .map(|file| Box::new(file) as BoxedWriter)
                .context("Stdin FIFO is not open for writing"),
            Sink::FifoOut => self
                .endpoints
                .take_fifo_out()
                .map(|file| Box::new(file) as BoxedWriter)
                .context("Stdout FIFO is not open for writing"),
            Sink::Socket => self
                .endpoints
                .take_socket_writer()
                .map(|half| Box::new(half) as BoxedWriter)
                .context("Socket is not open for writing"),
        }
    }
}

async fn join_pump(direction: PumpDirection, handle: JoinHandle<PumpOutcome>) -> PumpOutcome {
    handle.await.unwrap_or_else(|e| {
        error!("{} pump task failed: {}", direction, e);
        PumpOutcome::Error
    })
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if self.state == SessionState::Running {
            warn!("SessionManager dropped without proper shutdown");
        }
    }
}
