//! Relay engine module
//!
//! The forwarding engine: routing policy, pump workers, cross-pump
//! cancellation, and session lifecycle.

pub mod coordinator;
pub mod pump;
pub mod route;
pub mod session_manager;

pub use coordinator::{Coordinator, PumpState, SessionStatus};
pub use pump::{Pump, PumpDirection, PumpOutcome};
pub use route::{Route, RoutePlan, Sink, Source, Topology};
pub use session_manager::{SessionConfig, SessionManager, SessionReport, SessionState, SocketConfig};
