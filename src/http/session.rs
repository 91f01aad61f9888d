//! Session cookie management.
//!
//! Issues an opaque session id to clients that do not present one. Nothing
//! is stored server-side; handlers read the id from the [`SessionId`]
//! extension and keep their own state.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 60);

/// The session id attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Cookie attributes for issued sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie {
    secure: bool,
}

impl SessionCookie {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn header_value(&self, id: &str) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; Max-Age={}",
            SESSION_MAX_AGE.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

/// Find a cookie value by name across all `Cookie` headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub async fn session_middleware(
    State(cookie): State<SessionCookie>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Only ids this service could have issued are honoured.
    let existing = find_cookie(request.headers(), SESSION_COOKIE)
        .filter(|id| Uuid::parse_str(id).is_ok())
        .map(str::to_string);

    let (id, fresh) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };
    request.extensions_mut().insert(SessionId(id.clone()));

    let mut response = next.run(request).await;
    if fresh {
        if let Some(value) = cookie.header_value(&id) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        tracing::debug!(session = %id, "Session issued");
    }
    response
}
