//! Static and dynamic route registrations.
//!
//! # Responsibilities
//! - Validate mount paths and HTTP methods at registration
//! - Serve files under a static mount, falling through on misses
//! - Match dynamic routes by method and path pattern
//!
//! # Design Decisions
//! - Static mounts only answer GET and HEAD, like a file server should
//! - Path patterns use `{param}` syntax; `:param` segments are accepted
//! - A GET route also answers HEAD

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::{FrontendError, Result};
use crate::redirect::RedirectEngine;

/// Route parameters captured from the request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(pub HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// A type-erased dynamic route handler.
pub type DynamicHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Box an async function into a [`DynamicHandler`].
pub fn handler<F, Fut, R>(f: F) -> DynamicHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |req| {
        let fut = f(req);
        Box::pin(async move { fut.await.into_response() })
    })
}

fn validate_mount_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(FrontendError::validation("path", format!("'{path}' must start with '/'")));
    }
    Ok(())
}

/// A directory served under a URL prefix.
#[derive(Clone)]
pub struct StaticMount {
    prefix: String,
    dir: PathBuf,
    service: ServeDir,
}

impl StaticMount {
    pub fn new(path: &str, dir: impl Into<PathBuf>) -> Result<Self> {
        validate_mount_path(path)?;
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(FrontendError::validation("dir", "must not be empty"));
        }
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "Static directory does not exist yet");
        }
        let prefix = match path.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        Ok(Self {
            service: ServeDir::new(&dir),
            prefix,
            dir,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The part of `path` below this mount, if the mount covers it.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// The request to hand the file server, rewritten below the mount.
    /// `None` when the mount does not cover `request`.
    pub fn file_request(&self, request: &Request<Body>) -> Option<Request<Body>> {
        if request.method() != Method::GET && request.method() != Method::HEAD {
            return None;
        }
        let rest = self.strip(request.uri().path())?;
        let target = match request.uri().query() {
            Some(query) => format!("{rest}?{query}"),
            None => rest.to_string(),
        };
        let uri: Uri = target.parse().ok()?;

        let mut inner = Request::builder()
            .method(request.method().clone())
            .uri(uri)
            .body(Body::empty())
            .ok()?;
        *inner.headers_mut() = request.headers().clone();
        Some(inner)
    }

    /// Serve a request built by [`file_request`](Self::file_request) from
    /// disk. `None` means fall through.
    /// `Body` is not `Sync`; no borrow of a request may live across the read.
    pub async fn serve(&self, inner: Request<Body>) -> Option<Response> {
        let path = inner.uri().path().to_string();
        let response = match self.service.clone().oneshot(inner).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.status() == StatusCode::NOT_FOUND {
            return None;
        }

        let mut response = response.map(Body::new);
        if response.status().is_redirection() && self.prefix != "/" {
            // Directory redirects are computed below the mount; put the prefix back.
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .filter(|l| l.starts_with('/'))
                .map(|l| format!("{}{l}", self.prefix));
            if let Some(value) = location.and_then(|l| HeaderValue::from_str(&l).ok()) {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }
        tracing::trace!(mount = %self.prefix, path = %path, "Served static file");
        Some(response)
    }
}

impl fmt::Debug for StaticMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMount")
            .field("prefix", &self.prefix)
            .field("dir", &self.dir)
            .finish()
    }
}

/// Which methods a dynamic route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    /// Parse a method name. `all` matches every method.
    pub fn parse(name: &str) -> Result<Self> {
        let upper = name.to_ascii_uppercase();
        let method = match upper.as_str() {
            "ALL" | "ANY" => return Ok(Self::Any),
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "CONNECT" => Method::CONNECT,
            _ => {
                return Err(FrontendError::validation(
                    "method",
                    format!("http method not recognized: {name}"),
                ))
            }
        };
        Ok(Self::Only(method))
    }

    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(expected) => {
                expected == method || (*expected == Method::GET && method == Method::HEAD)
            }
        }
    }
}

/// Rewrite `:name` segments into `{name}` pattern syntax.
fn normalize_pattern(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A handler bound to a method and path pattern.
#[derive(Clone)]
pub struct DynamicRoute {
    path: String,
    method: MethodFilter,
    matcher: Arc<matchit::Router<()>>,
    handler: DynamicHandler,
}

impl DynamicRoute {
    pub fn new(path: &str, method: &str, handler: DynamicHandler) -> Result<Self> {
        validate_mount_path(path)?;
        let method = MethodFilter::parse(method)?;
        let pattern = normalize_pattern(path);
        let mut matcher = matchit::Router::new();
        matcher
            .insert(pattern.clone(), ())
            .map_err(|e| FrontendError::validation("path", e.to_string()))?;
        Ok(Self {
            path: pattern,
            method,
            matcher: Arc::new(matcher),
            handler,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Captured parameters when this route answers the request.
    pub fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if !self.method.allows(method) {
            return None;
        }
        let matched = self.matcher.at(path).ok()?;
        Some(PathParams(
            matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    pub async fn call(&self, request: Request<Body>) -> Response {
        (self.handler)(request).await
    }
}

impl fmt::Debug for DynamicRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRoute")
            .field("path", &self.path)
            .field("method", &self.method)
            .finish()
    }
}

/// One registration in the route table.
#[derive(Debug, Clone)]
pub enum Mount {
    Static(StaticMount),
    Dynamic(DynamicRoute),
    Redirect(RedirectEngine),
}
