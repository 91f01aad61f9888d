//! Per-request redirect evaluation.
//!
//! # Responsibilities
//! - Split the source authority into host and port
//! - Decide whether a rule applies
//! - Infer the destination port and compose the `Location`
//!
//! # Design Decisions
//! - Evaluation is synchronous and pure; the decision is a value
//! - Any request the engine cannot reason about passes through

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::Span;

use crate::error::Result;
use crate::http::request::ConnectionScheme;
use crate::redirect::rule::{RedirectRule, RedirectSpec};

/// A redirect decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    status: StatusCode,
    location: HeaderValue,
}

impl Redirect {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn location(&self) -> &str {
        // Built from a checked `HeaderValue::from_str`, so always visible ASCII.
        self.location.to_str().unwrap_or_default()
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        (self.status, [(header::LOCATION, self.location)]).into_response()
    }
}

/// Split `host[:port]` on the first colon. Bracketed IPv6 literals keep
/// their colons. An empty port counts as absent.
pub fn split_authority(authority: &str) -> (&str, Option<&str>) {
    let (host, port) = if authority.starts_with('[') {
        match authority.find(']') {
            Some(end) => {
                let (host, rest) = authority.split_at(end + 1);
                (host, rest.strip_prefix(':'))
            }
            None => (authority, None),
        }
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };
    (host, port.filter(|p| !p.is_empty()))
}

/// Scheme the request arrived on.
fn source_protocol(req: &Request<Body>) -> &str {
    if let Some(ConnectionScheme(scheme)) = req.extensions().get::<ConnectionScheme>() {
        return scheme;
    }
    req.uri().scheme_str().unwrap_or("http")
}

fn source_authority(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
}

/// Evaluates one redirect rule against inbound requests.
#[derive(Debug, Clone)]
pub struct RedirectEngine {
    rule: RedirectRule,
    span: Span,
}

impl RedirectEngine {
    pub fn new(spec: RedirectSpec) -> Result<Self> {
        Ok(Self::from_rule(RedirectRule::new(spec)?))
    }

    pub fn from_rule(rule: RedirectRule) -> Self {
        let span = tracing::debug_span!(
            "redirect",
            dest_protocol = ?rule.dest_protocol,
            dest_host = ?rule.dest_host,
            dest_port = ?rule.dest_port,
        );
        Self { rule, span }
    }

    pub fn rule(&self) -> &RedirectRule {
        &self.rule
    }

    /// Decide whether `req` is redirected, and where.
    pub fn evaluate(&self, req: &Request<Body>) -> Option<Redirect> {
        let authority = source_authority(req)?;
        let (src_host, src_port) = split_authority(authority);
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let applies = self.rule.match_host.is_match(src_host)
            && self.rule.match_url.is_match(target)
            && self.rule.match_fn.as_ref().map_or(true, |f| f.matches(req));
        if !applies {
            return None;
        }

        let port = match self.rule.dest_port {
            Some(port) => Some(port.to_string()),
            None if self.rule.changes_origin() => None,
            None => src_port.map(str::to_string),
        };

        let protocol = source_protocol(req);
        let location = format!(
            "{}://{}{}{}",
            self.rule.dest_protocol.as_deref().unwrap_or(protocol),
            self.rule.dest_host.as_deref().unwrap_or(src_host),
            port.map(|p| format!(":{p}")).unwrap_or_default(),
            self.rule.dest_url.as_deref().unwrap_or(target),
        );

        let _enter = self.span.enter();
        let location = match HeaderValue::from_str(&location) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(location = %location, "Redirect target is not a valid header value, passing through");
                return None;
            }
        };
        let status = if self.rule.temporary {
            StatusCode::TEMPORARY_REDIRECT
        } else {
            StatusCode::MOVED_PERMANENTLY
        };

        tracing::debug!(
            from = %format_args!("{protocol}://{authority}{target}"),
            to = %location.to_str().unwrap_or_default(),
            status = status.as_u16(),
            "Redirecting"
        );
        Some(Redirect { status, location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn request(host: &str, target: &str) -> Request<Body> {
        Request::builder()
            .uri(target)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    fn engine(spec: RedirectSpec) -> RedirectEngine {
        RedirectEngine::new(spec).unwrap()
    }

    #[test]
    fn splits_authority() {
        assert_eq!(split_authority("localhost:8080"), ("localhost", Some("8080")));
        assert_eq!(split_authority("localhost"), ("localhost", None));
        assert_eq!(split_authority("localhost:"), ("localhost", None));
        assert_eq!(split_authority("[::1]:8080"), ("[::1]", Some("8080")));
        assert_eq!(split_authority("[::1]"), ("[::1]", None));
    }

    #[test]
    fn protocol_change_drops_source_port() {
        let redirect = engine(RedirectSpec::new().dest_protocol("https"))
            .evaluate(&request("localhost:8080", "/"))
            .unwrap();
        assert_eq!(redirect.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(redirect.location(), "https://localhost/");
    }

    #[test]
    fn explicit_port_wins() {
        let redirect = engine(RedirectSpec::new().dest_protocol("https").dest_port(8443))
            .evaluate(&request("localhost:8080", "/"))
            .unwrap();
        assert_eq!(redirect.location(), "https://localhost:8443/");
    }

    #[test]
    fn host_rewrite_with_fixed_url() {
        let redirect = engine(
            RedirectSpec::new()
                .dest_host("example.com")
                .dest_protocol("https")
                .dest_url("/"),
        )
        .evaluate(&request("localhost:8080", "/anything"))
        .unwrap();
        assert_eq!(redirect.location(), "https://example.com/");
    }

    #[test]
    fn same_origin_keeps_source_port() {
        let redirect = engine(RedirectSpec::new().dest_url("/new"))
            .evaluate(&request("localhost:8080", "/old"))
            .unwrap();
        assert_eq!(redirect.location(), "http://localhost:8080/new");
    }

    #[test]
    fn default_destination_keeps_query() {
        let redirect = engine(RedirectSpec::new().dest_protocol("https"))
            .evaluate(&request("localhost", "/search?q=rust"))
            .unwrap();
        assert_eq!(redirect.location(), "https://localhost/search?q=rust");
    }

    #[test]
    fn source_protocol_comes_from_connection() {
        let mut req = request("localhost:8443", "/a");
        req.extensions_mut().insert(ConnectionScheme("https"));
        let redirect = engine(RedirectSpec::new().dest_url("/b"))
            .evaluate(&req)
            .unwrap();
        assert_eq!(redirect.location(), "https://localhost:8443/b");
    }

    #[test]
    fn temporary_selects_307() {
        let redirect = engine(RedirectSpec::new().dest_protocol("https").temporary(true))
            .evaluate(&request("localhost", "/"))
            .unwrap();
        assert_eq!(redirect.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[test]
    fn host_mismatch_passes_through() {
        let engine = engine(
            RedirectSpec::new()
                .dest_protocol("https")
                .match_host(Regex::new(r"google\.com").unwrap()),
        );
        assert!(engine.evaluate(&request("localhost:8080", "/")).is_none());
        assert!(engine.evaluate(&request("www.google.com", "/")).is_some());
    }

    #[test]
    fn url_mismatch_passes_through() {
        let engine = engine(RedirectSpec::new().dest_protocol("https").match_url("^/secure"));
        assert!(engine.evaluate(&request("localhost", "/public")).is_none());
        assert!(engine.evaluate(&request("localhost", "/secure/page")).is_some());
    }

    #[test]
    fn predicate_gates_the_rule() {
        let engine = engine(
            RedirectSpec::new()
                .dest_protocol("https")
                .match_fn(|req: &Request<Body>| req.headers().contains_key("x-upgrade")),
        );
        assert!(engine.evaluate(&request("localhost", "/")).is_none());

        let mut req = request("localhost", "/");
        req.headers_mut().insert("x-upgrade", HeaderValue::from_static("1"));
        assert!(engine.evaluate(&req).is_some());
    }

    #[test]
    fn missing_host_passes_through() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(engine(RedirectSpec::new().dest_protocol("https"))
            .evaluate(&req)
            .is_none());
    }

    #[test]
    fn absolute_uri_authority_is_used_without_host_header() {
        let req = Request::builder()
            .uri("http://localhost:8080/x")
            .body(Body::empty())
            .unwrap();
        let redirect = engine(RedirectSpec::new().dest_url("/y")).evaluate(&req).unwrap();
        assert_eq!(redirect.location(), "http://localhost:8080/y");
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = engine(RedirectSpec::new().dest_protocol("https").dest_port(8443));
        let req = request("localhost:8080", "/page");
        assert_eq!(engine.evaluate(&req), engine.evaluate(&req));
    }
}
