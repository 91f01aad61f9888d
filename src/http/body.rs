//! Request body decoding.
//!
//! Buffers the body up to the configured limit, decodes it according to the
//! selected mode when the `Content-Type` matches, and attaches the result as
//! a [`ParsedBody`] extension. The raw bytes are put back so handlers can
//! still read the body themselves.

use std::error::Error as StdError;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;

use crate::config::BodyParserMode;

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    Raw(Bytes),
    Text(String),
    Form(Vec<(String, String)>),
}

/// Body parser selected by the body-parser mode.
#[derive(Debug, Clone, Copy)]
pub struct BodyParser {
    mode: BodyParserMode,
    limit: usize,
}

impl BodyParser {
    pub fn new(mode: BodyParserMode, limit: usize) -> Self {
        Self { mode, limit }
    }

    /// Whether a request with this content type is decoded.
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return false;
        };
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match self.mode {
            BodyParserMode::None => false,
            BodyParserMode::Json => media_type == "application/json" || media_type.ends_with("+json"),
            BodyParserMode::Raw => media_type == "application/octet-stream",
            BodyParserMode::Text => media_type == "text/plain",
            BodyParserMode::UrlEncoded => media_type == "application/x-www-form-urlencoded",
        }
    }

    /// Decode `bytes`, or explain why they are malformed.
    pub fn decode(&self, bytes: &Bytes) -> Result<Option<ParsedBody>, String> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let parsed = match self.mode {
            BodyParserMode::None => return Ok(None),
            BodyParserMode::Json => serde_json::from_slice(bytes)
                .map(ParsedBody::Json)
                .map_err(|e| format!("invalid JSON body: {e}"))?,
            BodyParserMode::Raw => ParsedBody::Raw(bytes.clone()),
            BodyParserMode::Text => String::from_utf8(bytes.to_vec())
                .map(ParsedBody::Text)
                .map_err(|_| "text body is not valid UTF-8".to_string())?,
            BodyParserMode::UrlEncoded => {
                ParsedBody::Form(url::form_urlencoded::parse(bytes).into_owned().collect())
            }
        };
        Ok(Some(parsed))
    }
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

pub async fn body_parser_middleware(
    State(parser): State<BodyParser>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !parser.accepts(content_type) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, parser.limit).await {
        Ok(bytes) => bytes,
        Err(e) if exceeded_limit(&e) => {
            tracing::debug!(limit = parser.limit, "Request body too large");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request entity too large").into_response();
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };

    match parser.decode(&bytes) {
        Ok(Some(parsed)) => {
            parts.extensions.insert(parsed);
        }
        Ok(None) => {}
        Err(reason) => {
            tracing::debug!(mode = %parser.mode, reason = %reason, "Rejected request body");
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
