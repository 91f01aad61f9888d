//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (walk mounts in registration order)
//!     → mount.rs (static prefix / dynamic pattern match)
//!     → Return: handler response, static file, or 404
//!
//! Registration (before start):
//!     add_static / add_dynamic
//!     → validate path, method, pattern
//!     → frozen into a MountTable at start
//! ```
//!
//! # Design Decisions
//! - Routes frozen at start, immutable at runtime
//! - Deterministic: same input always reaches the same mount
//! - First match wins (registration order)

pub mod mount;
pub mod router;

pub use mount::{handler, DynamicHandler, DynamicRoute, MethodFilter, Mount, PathParams, StaticMount};
pub use router::{route_request, MountTable};
