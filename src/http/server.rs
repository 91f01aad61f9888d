//! The front-end service: configuration gate, registrations and listener.
//!
//! # Responsibilities
//! - Expose the configuration surface, fenced by the [`ConfigGate`]
//! - Collect redirect rules and route registrations before start
//! - Assemble the middleware chain and bind the listener on start
//! - Close the listener with a graceful drain on shutdown
//!
//! # Design Decisions
//! - Registrations take the registry lock before checking the gate, and
//!   `start` moves the gate to `Starting` before snapshotting the registry,
//!   so a registration racing `start` is either served or rejected
//! - Redirect rules and routes share one registration-ordered table
//! - The router is rebuilt from frozen snapshots; nothing is shared mutably
//!   with request tasks

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{middleware, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::{BodyParserMode, ConfigGate, FrontendConfig, Phase, ServiceConfig};
use crate::error::{FrontendError, Result};
use crate::http::body::{body_parser_middleware, BodyParser};
use crate::http::request::{request_log_middleware, RequestLog};
use crate::http::session::{session_middleware, SessionCookie};
use crate::net::listener::{self, ListenerHandle};
use crate::net::tls::{load_tls_config, CertificateProvider, PemFileProvider};
use crate::redirect::{RedirectEngine, RedirectSpec};
use crate::routing::{route_request, DynamicHandler, DynamicRoute, Mount, MountTable, StaticMount};
use crate::security;

/// An HTTP(S) front-end, configured before start and frozen after.
pub struct FrontEnd {
    gate: ConfigGate,
    registry: Mutex<Vec<Mount>>,
    certificates: Mutex<Option<Arc<dyn CertificateProvider>>>,
    listener: Mutex<Option<ListenerHandle>>,
    span: Span,
}

impl Default for FrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontEnd {
    pub fn new() -> Self {
        Self::with_gate(ConfigGate::new())
    }

    fn with_gate(gate: ConfigGate) -> Self {
        Self {
            gate,
            registry: Mutex::new(Vec::new()),
            certificates: Mutex::new(None),
            listener: Mutex::new(None),
            span: tracing::info_span!("web_frontend"),
        }
    }

    /// Build a front-end from a validated configuration file.
    pub fn from_config(config: &FrontendConfig) -> Result<Self> {
        let bind_ip: IpAddr = config.listener.bind_ip.parse().map_err(|_| {
            FrontendError::validation(
                "listener.bind_ip",
                format!("'{}' is not an IP address", config.listener.bind_ip),
            )
        })?;
        if config.listener.port == Some(0) {
            return Err(FrontendError::validation("port", "must be between 1 and 65535"));
        }
        if config.http.body_limit == 0 {
            return Err(FrontendError::validation("body_limit", "must be greater than zero"));
        }

        let frontend = Self::with_gate(ConfigGate::with_settings(ServiceConfig {
            port: config.listener.port,
            domain: config.listener.domain.clone(),
            use_tls: config.tls.enabled,
            body_parser: config.http.body_parser,
            session_enabled: config.http.session,
            bind_ip,
            security_headers: config.http.security_headers,
            body_limit: config.http.body_limit,
            shutdown_grace: Duration::from_secs(config.shutdown.grace_secs),
        }));

        if let (Some(cert), Some(key)) = (&config.tls.cert_path, &config.tls.key_path) {
            frontend.set_certificate_provider(PemFileProvider::new(cert, key))?;
        }
        for redirect in &config.redirects {
            frontend.set_redirect(RedirectSpec::from(redirect.clone()))?;
        }
        for mount in &config.statics {
            frontend.add_static(&mount.path, &mount.dir)?;
        }
        Ok(frontend)
    }

    /// The configuration gate, for settings without a dedicated method.
    pub fn gate(&self) -> &ConfigGate {
        &self.gate
    }

    pub fn phase(&self) -> Phase {
        self.gate.phase()
    }

    pub fn set_port(&self, port: u16) -> Result<()> {
        self.gate.set_port(port)
    }

    pub fn port(&self) -> Option<u16> {
        self.gate.port()
    }

    pub fn set_domain(&self, domain: impl Into<String>) -> Result<()> {
        self.gate.set_domain(domain)
    }

    pub fn domain(&self) -> Option<String> {
        self.gate.domain()
    }

    pub fn set_https(&self, enabled: bool) -> Result<()> {
        self.gate.set_tls(enabled)
    }

    pub fn protocol(&self) -> &'static str {
        self.gate.protocol()
    }

    pub fn set_body_parser(&self, mode: BodyParserMode) -> Result<()> {
        self.gate.set_body_parser(mode)
    }

    pub fn set_enable_session(&self, enabled: bool) -> Result<()> {
        self.gate.set_enable_session(enabled)
    }

    /// Install the source of TLS material queried at start.
    pub fn set_certificate_provider(&self, provider: impl CertificateProvider + 'static) -> Result<()> {
        let mut slot = self.certificates.lock().expect("certificate slot poisoned");
        self.gate.ensure_configurable("set certificate provider")?;
        *slot = Some(Arc::new(provider));
        Ok(())
    }

    fn registry(&self) -> MutexGuard<'_, Vec<Mount>> {
        self.registry.lock().expect("registry mutex poisoned")
    }

    /// Append a redirect rule. Rules and routes are tried in registration
    /// order, so a route registered earlier is served before the rule.
    pub fn set_redirect(&self, spec: RedirectSpec) -> Result<()> {
        let engine = RedirectEngine::new(spec)?;
        let mut registry = self.registry();
        self.gate.ensure_configurable("set redirect")?;
        tracing::debug!(parent: &self.span, rule = ?engine.rule(), "Redirect registered");
        registry.push(Mount::Redirect(engine));
        Ok(())
    }

    /// Serve `dir` under the URL prefix `path`.
    pub fn add_static(&self, path: &str, dir: impl Into<PathBuf>) -> Result<()> {
        let mount = StaticMount::new(path, dir)?;
        let mut registry = self.registry();
        self.gate.ensure_configurable("add static route")?;
        tracing::debug!(parent: &self.span, mount = ?mount, "Adding static route");
        registry.push(Mount::Static(mount));
        Ok(())
    }

    /// Route `method` requests matching `path` to `handler`.
    ///
    /// `method` is an HTTP method name or `all`; `path` accepts `{param}`,
    /// `{*rest}` and `:param` segments.
    pub fn add_dynamic(&self, path: &str, method: &str, handler: DynamicHandler) -> Result<()> {
        let route = DynamicRoute::new(path, method, handler)?;
        let mut registry = self.registry();
        self.gate.ensure_configurable("add dynamic route")?;
        tracing::debug!(parent: &self.span, route = ?route, "Adding dynamic route");
        registry.push(Mount::Dynamic(route));
        Ok(())
    }

    /// Build the service from the current settings and registrations.
    ///
    /// `start` serves exactly this; tests can drive it directly.
    pub fn app(&self) -> Router {
        build_app(&self.gate.settings(), self.snapshot())
    }

    fn snapshot(&self) -> MountTable {
        MountTable::new(self.registry().clone())
    }

    /// Bind the listener and start serving. Returns the bound address.
    ///
    /// Settings and registrations are frozen from here on. If fetching TLS
    /// material or binding fails, the front-end stays configurable.
    pub async fn start(&self) -> Result<SocketAddr> {
        let guard = self.gate.begin_start()?;
        let settings = guard.settings().clone();
        let table = self.snapshot();

        let tls = if settings.use_tls {
            let provider = self
                .certificates
                .lock()
                .expect("certificate slot poisoned")
                .clone()
                .ok_or(FrontendError::DependencyMissing("certificate provider"))?;
            let material = provider.certificates()?;
            Some(load_tls_config(&material).await?)
        } else {
            None
        };

        tracing::debug!(
            parent: &self.span,
            protocol = settings.protocol(),
            port = settings.effective_port(),
            redirects = table.redirect_count(),
            routes = table.len() - table.redirect_count(),
            "Starting server"
        );

        let app = build_app(&settings, table);
        let addr = SocketAddr::new(settings.bind_ip, settings.effective_port());
        let socket = listener::bind(addr).await?;
        let handle = ListenerHandle::serve(socket, app, tls, settings.shutdown_grace)?;
        let local_addr = handle.local_addr();

        *self.listener.lock().expect("listener slot poisoned") = Some(handle);
        guard.commit();

        tracing::info!(
            parent: &self.span,
            address = %local_addr,
            protocol = settings.protocol(),
            domain = settings.domain.as_deref().unwrap_or(""),
            "Front-end listening"
        );
        Ok(local_addr)
    }

    /// Address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener
            .lock()
            .expect("listener slot poisoned")
            .as_ref()
            .map(ListenerHandle::local_addr)
    }

    /// Stop accepting, drain in-flight requests and release the socket.
    pub async fn shutdown(&self) -> Result<()> {
        let handle = self
            .listener
            .lock()
            .expect("listener slot poisoned")
            .take()
            .ok_or(FrontendError::NotStarted)?;
        self.gate.stop();

        tracing::debug!(
            parent: &self.span,
            connections = handle.connection_count(),
            "Shutting down web component"
        );
        if let Err(e) = handle.close().await {
            tracing::warn!(parent: &self.span, error = %e, "Server task ended with an error");
        }
        tracing::info!(parent: &self.span, "Front-end stopped");
        Ok(())
    }
}

impl Drop for FrontEnd {
    fn drop(&mut self) {
        if let Ok(slot) = self.listener.get_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

/// Assemble the middleware chain around the route table.
///
/// Layers wrap outward, so they are added innermost first: session, body
/// parser, request log. Security headers and request ids sit outside
/// everything so every response carries them.
fn build_app(settings: &ServiceConfig, table: MountTable) -> Router {
    let mut app = Router::new().fallback(route_request).with_state(table);

    if settings.session_enabled {
        let cookie = SessionCookie::new(settings.use_tls);
        app = app.layer(middleware::from_fn_with_state(cookie, session_middleware));
    }
    if settings.body_parser != BodyParserMode::None {
        let parser = BodyParser::new(settings.body_parser, settings.body_limit);
        app = app.layer(middleware::from_fn_with_state(parser, body_parser_middleware));
    }
    app = app.layer(middleware::from_fn_with_state(
        Arc::new(RequestLog::new(settings)),
        request_log_middleware,
    ));
    if settings.security_headers {
        app = security::headers::apply(app);
    }

    app.layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
