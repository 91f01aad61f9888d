//! Redirect rule specification and construction.

use std::fmt;
use std::sync::Arc;

use crate::config::schema::RedirectConfig;
use crate::error::{FrontendError, Result};
use crate::redirect::matcher::{Pattern, PatternSource, RequestPredicate};

/// Builder for a redirect rule.
///
/// Empty strings count as absent, so `dest_url("")` keeps the original
/// request target.
#[derive(Clone, Default)]
pub struct RedirectSpec {
    match_host: Option<PatternSource>,
    match_url: Option<PatternSource>,
    match_fn: Option<Arc<dyn RequestPredicate>>,
    dest_protocol: Option<String>,
    dest_host: Option<String>,
    dest_port: Option<u16>,
    dest_url: Option<String>,
    temporary: bool,
}

impl RedirectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_host(mut self, pattern: impl Into<PatternSource>) -> Self {
        self.match_host = Some(pattern.into());
        self
    }

    pub fn match_url(mut self, pattern: impl Into<PatternSource>) -> Self {
        self.match_url = Some(pattern.into());
        self
    }

    pub fn match_fn(mut self, predicate: impl RequestPredicate + 'static) -> Self {
        self.match_fn = Some(Arc::new(predicate));
        self
    }

    pub fn dest_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.dest_protocol = Some(protocol.into());
        self
    }

    pub fn dest_host(mut self, host: impl Into<String>) -> Self {
        self.dest_host = Some(host.into());
        self
    }

    pub fn dest_port(mut self, port: u16) -> Self {
        self.dest_port = Some(port);
        self
    }

    pub fn dest_url(mut self, url: impl Into<String>) -> Self {
        self.dest_url = Some(url.into());
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }
}

impl fmt::Debug for RedirectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectSpec")
            .field("match_host", &self.match_host)
            .field("match_url", &self.match_url)
            .field("match_fn", &self.match_fn.is_some())
            .field("dest_protocol", &self.dest_protocol)
            .field("dest_host", &self.dest_host)
            .field("dest_port", &self.dest_port)
            .field("dest_url", &self.dest_url)
            .field("temporary", &self.temporary)
            .finish()
    }
}

impl From<RedirectConfig> for RedirectSpec {
    fn from(config: RedirectConfig) -> Self {
        Self {
            match_host: config.match_host.map(PatternSource::from),
            match_url: config.match_url.map(PatternSource::from),
            match_fn: None,
            dest_protocol: config.dest_protocol,
            dest_host: config.dest_host,
            dest_port: config.dest_port,
            dest_url: config.dest_url,
            temporary: config.temporary,
        }
    }
}

/// A compiled, immutable redirect rule.
#[derive(Clone)]
pub struct RedirectRule {
    pub(crate) match_host: Pattern,
    pub(crate) match_url: Pattern,
    pub(crate) match_fn: Option<Arc<dyn RequestPredicate>>,
    pub(crate) dest_protocol: Option<String>,
    pub(crate) dest_host: Option<String>,
    pub(crate) dest_port: Option<u16>,
    pub(crate) dest_url: Option<String>,
    pub(crate) temporary: bool,
}

impl RedirectRule {
    /// Validate and compile a rule.
    ///
    /// Field shapes are checked first; a rule with no destination at all is
    /// a [`FrontendError::Configuration`].
    pub fn new(spec: RedirectSpec) -> Result<Self> {
        let dest_protocol = non_empty(spec.dest_protocol);
        let dest_host = non_empty(spec.dest_host);
        let dest_url = non_empty(spec.dest_url);

        if let Some(protocol) = &dest_protocol {
            let mut chars = protocol.chars();
            let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return Err(FrontendError::validation(
                    "dest_protocol",
                    format!("'{protocol}' is not a URL scheme"),
                ));
            }
        }
        if let Some(host) = &dest_host {
            if host.contains(|c: char| c == '/' || c.is_whitespace()) {
                return Err(FrontendError::validation(
                    "dest_host",
                    format!("'{host}' is not a host name"),
                ));
            }
        }
        if spec.dest_port == Some(0) {
            return Err(FrontendError::validation("dest_port", "must be non-zero"));
        }
        if let Some(url) = &dest_url {
            if !url.starts_with('/') {
                return Err(FrontendError::validation(
                    "dest_url",
                    format!("'{url}' must start with '/'"),
                ));
            }
        }

        let match_host = Pattern::compile("match_host", spec.match_host)?;
        let match_url = Pattern::compile("match_url", spec.match_url)?;

        if dest_protocol.is_none() && dest_host.is_none() && spec.dest_port.is_none() && dest_url.is_none() {
            return Err(FrontendError::Configuration);
        }

        Ok(Self {
            match_host,
            match_url,
            match_fn: spec.match_fn,
            dest_protocol,
            dest_host,
            dest_port: spec.dest_port,
            dest_url,
            temporary: spec.temporary,
        })
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// True when the destination changes host or scheme, which drops the
    /// source port unless one is given explicitly.
    pub fn changes_origin(&self) -> bool {
        self.dest_host.is_some() || self.dest_protocol.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl fmt::Debug for RedirectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectRule")
            .field("match_host", &self.match_host)
            .field("match_url", &self.match_url)
            .field("match_fn", &self.match_fn.is_some())
            .field("dest_protocol", &self.dest_protocol)
            .field("dest_host", &self.dest_host)
            .field("dest_port", &self.dest_port)
            .field("dest_url", &self.dest_url)
            .field("temporary", &self.temporary)
            .finish()
    }
}
