//! Request logging and connection metadata.
//!
//! # Responsibilities
//! - Tag each request with the scheme it arrived on
//! - Emit one structured log event per request
//! - Count requests by method and status
//!
//! # Design Decisions
//! - Runs first in the chain so every later layer sees the scheme
//! - Client IP prefers `X-Forwarded-For`, then the peer address

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::config::ServiceConfig;
use crate::observability::metrics;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Scheme of the connection a request arrived on (`"http"` or `"https"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionScheme(pub &'static str);

/// Listener facts reported with every request.
#[derive(Debug)]
pub struct RequestLog {
    domain: Option<String>,
    port: u16,
    scheme: &'static str,
    span: Span,
}

impl RequestLog {
    pub fn new(settings: &ServiceConfig) -> Self {
        Self {
            domain: settings.domain.clone(),
            port: settings.effective_port(),
            scheme: settings.protocol(),
            span: tracing::info_span!("frontend", port = settings.effective_port()),
        }
    }
}

fn header_str<'a>(req: &'a Request<Body>, name: impl header::AsHeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Client address: first `X-Forwarded-For` entry, else the peer.
pub fn client_ip(req: &Request<Body>) -> Option<String> {
    header_str(req, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

pub async fn request_log_middleware(
    State(log): State<Arc<RequestLog>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(ConnectionScheme(log.scheme));

    let method = request.method().clone();
    {
        let _enter = log.span.enter();
        tracing::info!(
            domain = log.domain.as_deref().unwrap_or(""),
            port = log.port,
            https = log.scheme == "https",
            method = %method,
            url = %request.uri(),
            user_agent = header_str(&request, header::USER_AGENT).unwrap_or(""),
            referer = header_str(&request, header::REFERER).unwrap_or(""),
            ip = client_ip(&request).as_deref().unwrap_or(""),
            "request"
        );
    }

    let response = next.run(request).await;
    metrics::record_request(method.as_str(), response.status().as_u16());
    response
}
