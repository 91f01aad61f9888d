//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (add hardening headers if absent)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Enabled by default, switched off only through the config gate
//! - Never overrides a header a handler chose deliberately

pub mod headers;
