//! Lifecycle-gated HTTP(S) front-end.
//!
//! A [`FrontEnd`] is configured while stopped (port, domain, TLS, body
//! parsing, sessions, redirect rules, static and dynamic routes), then
//! started once. From that point every mutator fails with
//! [`FrontendError::AlreadyStarted`].
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ net::listener ──▶ http (request log, body, session)
//!                                              │
//!                                              ▼
//!                                      redirect engines ──▶ 301 / 307
//!                                              │ pass through
//!                                              ▼
//!                                      routing (static, dynamic, 404)
//!
//!     Cross-cutting: config (gate, file loading), observability,
//!     security headers, lifecycle signals
//! ```

// Core subsystems
pub mod command;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod redirect;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use command::{Command, CommandOutput};
pub use config::{BodyParserMode, ConfigGate, FrontendConfig, Phase, ServiceConfig};
pub use error::{FrontendError, Result};
pub use http::FrontEnd;
pub use net::{CertificateProvider, PemFileProvider, TlsMaterial};
pub use redirect::{RedirectEngine, RedirectSpec};
pub use routing::{handler, PathParams};
