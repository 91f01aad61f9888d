//! Match conditions for redirect rules.
//!
//! # Responsibilities
//! - Compile host and URL patterns (regular expressions)
//! - Carry caller-supplied request predicates
//!
//! # Design Decisions
//! - Patterns search anywhere in the subject, like an unanchored regex
//! - An absent or empty pattern matches everything
//! - Predicates are shared behind `Arc` and only ever read

use std::fmt;

use axum::body::Body;
use axum::http::Request;
use regex::Regex;

use crate::error::{FrontendError, Result};

/// Extra gating on a request, evaluated synchronously per request.
pub trait RequestPredicate: Send + Sync {
    /// Returns true if the request should be redirected.
    fn matches(&self, req: &Request<Body>) -> bool;
}

impl<F> RequestPredicate for F
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    fn matches(&self, req: &Request<Body>) -> bool {
        self(req)
    }
}

/// A pattern as supplied by the caller, before compilation.
#[derive(Debug, Clone)]
pub enum PatternSource {
    Text(String),
    Compiled(Regex),
}

impl From<&str> for PatternSource {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Regex> for PatternSource {
    fn from(value: Regex) -> Self {
        Self::Compiled(value)
    }
}

/// A compiled pattern. `None` matches everything.
#[derive(Clone)]
pub struct Pattern(Option<Regex>);

impl Pattern {
    pub fn any() -> Self {
        Self(None)
    }

    /// Compile `source`, naming `field` in any error.
    pub fn compile(field: &'static str, source: Option<PatternSource>) -> Result<Self> {
        match source {
            None => Ok(Self::any()),
            Some(PatternSource::Text(text)) if text.is_empty() => Ok(Self::any()),
            Some(PatternSource::Text(text)) => Regex::new(&text)
                .map(|re| Self(Some(re)))
                .map_err(|e| FrontendError::validation(field, e.to_string())),
            Some(PatternSource::Compiled(re)) => Ok(Self(Some(re))),
        }
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.0.as_ref().map_or(true, |re| re.is_match(subject))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref().map_or(".*", Regex::as_str)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}
