//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! start()
//!     → tls.rs (fetch PEM material from the certificate provider, TLS only)
//!     → listener.rs (bind socket, spawn axum-server)
//!     → ListenerHandle owned by the front-end
//!
//! shutdown()
//!     → ListenerHandle::close (stop accepting, drain, join)
//! ```
//!
//! # Design Decisions
//! - Sockets are bound before the gate commits, so a bind failure never
//!   reports the service as started
//! - TLS is optional and handled by rustls

pub mod listener;
pub mod tls;

pub use listener::ListenerHandle;
pub use tls::{CertificateProvider, PemFileProvider, TlsMaterial};
