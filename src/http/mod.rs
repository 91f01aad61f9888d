//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → request id + trace layers
//!     → security headers (response side)
//!     → request.rs (log the request, record the connection scheme)
//!     → body.rs (buffer and decode, if a parser is configured)
//!     → session.rs (issue or honour the session cookie, if enabled)
//!     → redirect engines (answer 301/307 or pass through)
//!     → route table (static mounts, dynamic routes, 404)
//! ```
//!
//! `server.rs` owns the assembly and the listener lifecycle.

pub mod body;
pub mod request;
pub mod server;
pub mod session;

pub use body::{BodyParser, ParsedBody};
pub use request::{ConnectionScheme, RequestLog};
pub use server::FrontEnd;
pub use session::{SessionCookie, SessionId};
