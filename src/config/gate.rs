//! Configuration gate: pre-start settings and the start/stop fence.
//!
//! # Responsibilities
//! - Own the settings record exclusively
//! - Reject every mutator once a start is in flight or complete
//! - Resolve the effective listen port
//!
//! # Design Decisions
//! - Settings and lifecycle phase live under one mutex so a mutator racing
//!   `start()` fails consistently
//! - Arguments are validated before the phase is checked
//! - A stopped gate stays fenced; reconfiguring needs a fresh instance

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::Span;

use crate::config::schema::BodyParserMode;
use crate::error::{FrontendError, Result};

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Front-end settings, frozen once the listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: Option<u16>,
    pub domain: Option<String>,
    pub use_tls: bool,
    pub body_parser: BodyParserMode,
    pub session_enabled: bool,
    pub bind_ip: IpAddr,
    pub security_headers: bool,
    pub body_limit: usize,
    pub shutdown_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: None,
            domain: None,
            use_tls: false,
            body_parser: BodyParserMode::None,
            session_enabled: false,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            security_headers: true,
            body_limit: DEFAULT_BODY_LIMIT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServiceConfig {
    /// `"https"` when TLS is enabled, otherwise `"http"`.
    pub fn protocol(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// The configured port, or the protocol default.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.use_tls {
            DEFAULT_HTTPS_PORT
        } else {
            DEFAULT_HTTP_PORT
        })
    }
}

/// Lifecycle phase of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mutators are accepted.
    Configuring,
    /// A start is in flight; mutators are already rejected.
    Starting,
    /// The listener is bound.
    Running,
    /// The listener was released. Mutation stays fenced.
    Stopped,
}

#[derive(Debug)]
struct GateState {
    settings: ServiceConfig,
    phase: Phase,
}

/// Single source of truth for front-end settings and the start fence.
#[derive(Debug)]
pub struct ConfigGate {
    state: Mutex<GateState>,
    span: Span,
}

impl Default for ConfigGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigGate {
    pub fn new() -> Self {
        Self::with_settings(ServiceConfig::default())
    }

    /// Create a gate seeded with pre-validated settings.
    pub fn with_settings(settings: ServiceConfig) -> Self {
        Self {
            state: Mutex::new(GateState {
                settings,
                phase: Phase::Configuring,
            }),
            span: tracing::debug_span!("config_gate"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().expect("config gate mutex poisoned")
    }

    /// Apply `update` only while the gate is still configuring.
    fn mutate(&self, action: &'static str, update: impl FnOnce(&mut ServiceConfig)) -> Result<()> {
        let mut state = self.lock();
        if state.phase != Phase::Configuring {
            return Err(FrontendError::AlreadyStarted { action });
        }
        update(&mut state.settings);
        let _enter = self.span.enter();
        tracing::debug!(action, "Setting updated");
        Ok(())
    }

    /// Reject the call if a start is in flight or complete.
    pub fn ensure_configurable(&self, action: &'static str) -> Result<()> {
        if self.lock().phase == Phase::Configuring {
            Ok(())
        } else {
            Err(FrontendError::AlreadyStarted { action })
        }
    }

    pub fn set_port(&self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(FrontendError::validation("port", "expected a positive integer, got 0"));
        }
        self.mutate("set port", |s| s.port = Some(port))
    }

    pub fn set_domain(&self, domain: impl Into<String>) -> Result<()> {
        let domain = domain.into();
        self.mutate("set domain", |s| s.domain = Some(domain))
    }

    pub fn set_tls(&self, enabled: bool) -> Result<()> {
        self.mutate("set https", |s| s.use_tls = enabled)
    }

    pub fn set_body_parser(&self, mode: BodyParserMode) -> Result<()> {
        self.mutate("set body parser", |s| s.body_parser = mode)
    }

    pub fn set_enable_session(&self, enabled: bool) -> Result<()> {
        self.mutate("set session", |s| s.session_enabled = enabled)
    }

    pub fn set_bind_ip(&self, ip: IpAddr) -> Result<()> {
        self.mutate("set bind address", |s| s.bind_ip = ip)
    }

    pub fn set_security_headers(&self, enabled: bool) -> Result<()> {
        self.mutate("set security headers", |s| s.security_headers = enabled)
    }

    pub fn set_body_limit(&self, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Err(FrontendError::validation("body_limit", "must be greater than 0"));
        }
        self.mutate("set body limit", |s| s.body_limit = bytes)
    }

    pub fn set_shutdown_grace(&self, grace: Duration) -> Result<()> {
        self.mutate("set shutdown grace", |s| s.shutdown_grace = grace)
    }

    pub fn port(&self) -> Option<u16> {
        self.lock().settings.port
    }

    pub fn domain(&self) -> Option<String> {
        self.lock().settings.domain.clone()
    }

    pub fn protocol(&self) -> &'static str {
        self.lock().settings.protocol()
    }

    pub fn effective_port(&self) -> u16 {
        self.lock().settings.effective_port()
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> ServiceConfig {
        self.lock().settings.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// True while the listener is serving. A stopped gate reports false
    /// but stays fenced; see [`Phase::Stopped`].
    pub fn is_started(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Enter the `Starting` phase.
    ///
    /// The returned guard rolls the gate back to `Configuring` when dropped
    /// without [`StartGuard::commit`], so a failed bind never reports the
    /// gate as started.
    pub fn begin_start(&self) -> Result<StartGuard<'_>> {
        let mut state = self.lock();
        if state.phase != Phase::Configuring {
            return Err(FrontendError::AlreadyStarted { action: "start" });
        }
        state.phase = Phase::Starting;
        let settings = state.settings.clone();
        drop(state);

        let _enter = self.span.enter();
        tracing::debug!(
            port = settings.effective_port(),
            protocol = settings.protocol(),
            "Configuration locked"
        );
        Ok(StartGuard {
            gate: self,
            settings,
            committed: false,
        })
    }

    /// Flip straight to `Running`. Returns the frozen settings.
    pub fn start(&self) -> Result<ServiceConfig> {
        let guard = self.begin_start()?;
        let settings = guard.settings().clone();
        guard.commit();
        Ok(settings)
    }

    /// Mark the listener released. Mutation stays fenced.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.phase == Phase::Running {
            state.phase = Phase::Stopped;
            let _enter = self.span.enter();
            tracing::debug!("Gate stopped");
        }
    }
}

/// An in-flight start. Commit once the listener is bound.
#[derive(Debug)]
pub struct StartGuard<'a> {
    gate: &'a ConfigGate,
    settings: ServiceConfig,
    committed: bool,
}

impl StartGuard<'_> {
    /// Settings frozen at the moment the start began.
    pub fn settings(&self) -> &ServiceConfig {
        &self.settings
    }

    pub fn commit(mut self) {
        self.gate.lock().phase = Phase::Running;
        self.committed = true;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.gate.lock().phase = Phase::Configuring;
            let _enter = self.gate.span.enter();
            tracing::debug!("Start aborted, configuration unlocked");
        }
    }
}
