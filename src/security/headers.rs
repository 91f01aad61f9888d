//! Security response headers.
//!
//! # Responsibilities
//! - Add hardening headers to every response
//! - Leave headers a handler already set untouched
//!
//! # Design Decisions
//! - One `SetResponseHeaderLayer` per header, applied to the whole router
//!   so the 404 fallback and redirects are covered too

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Header set applied when security headers are enabled.
pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (HeaderName::from_static("x-download-options"), HeaderValue::from_static("noopen")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
    ]
}

/// Wrap `router` with the security header layers.
pub fn apply(router: Router) -> Router {
    security_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}
