//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (FrontEnd::start):
//!     Configure → Fetch TLS material → Bind → Commit gate → Serve
//!
//! Shutdown (FrontEnd::shutdown):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown has a timeout: open connections are dropped after the grace period

pub mod signals;

pub use signals::shutdown_signal;
