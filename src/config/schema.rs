//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration for the front-end.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::gate::{DEFAULT_BODY_LIMIT, DEFAULT_SHUTDOWN_GRACE};
use crate::error::FrontendError;

/// Root configuration for the front-end.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontendConfig {
    /// Listener configuration (bind address, port, domain).
    pub listener: ListenerConfig,

    /// TLS settings.
    pub tls: TlsConfig,

    /// Middleware selection.
    pub http: HttpConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Redirect rules, evaluated in order.
    pub redirects: Vec<RedirectConfig>,

    /// Static directory mounts, registered in order.
    pub statics: Vec<StaticConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to bind (e.g., "0.0.0.0").
    pub bind_ip: String,

    /// Listen port. Unset means 80, or 443 with TLS.
    pub port: Option<u16>,

    /// Advisory public domain name.
    pub domain: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".to_string(),
            port: None,
            domain: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of HTTP.
    pub enabled: bool,

    /// Path to certificate chain file (PEM).
    pub cert_path: Option<String>,

    /// Path to private key file (PEM).
    pub key_path: Option<String>,
}

/// Middleware selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request body decoding mode.
    pub body_parser: BodyParserMode,

    /// Issue session cookies.
    pub session: bool,

    /// Add hardening response headers.
    pub security_headers: bool,

    /// Maximum buffered body size in bytes.
    pub body_limit: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_parser: BodyParserMode::None,
            session: false,
            security_headers: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds in-flight requests get to finish after shutdown begins.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_secs: DEFAULT_SHUTDOWN_GRACE.as_secs(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A redirect rule as written in a config file or a `set-redirect` command.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RedirectConfig {
    /// Regular expression over the source host.
    #[serde(default, alias = "matchHost")]
    pub match_host: Option<String>,

    /// Regular expression over the request path and query.
    #[serde(default, alias = "matchUrl")]
    pub match_url: Option<String>,

    #[serde(default, alias = "destProtocol")]
    pub dest_protocol: Option<String>,

    #[serde(default, alias = "destHost")]
    pub dest_host: Option<String>,

    #[serde(default, alias = "destPort")]
    pub dest_port: Option<u16>,

    #[serde(default, alias = "destUrl")]
    pub dest_url: Option<String>,

    /// 307 instead of 301.
    #[serde(default, alias = "dest_temporary", alias = "destTemporary")]
    pub temporary: bool,
}

/// A static directory mount.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// URL prefix, e.g. "/static".
    pub path: String,

    /// Directory served under the prefix.
    pub dir: String,
}

/// How request bodies are decoded before reaching handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyParserMode {
    #[default]
    None,
    Json,
    Raw,
    Text,
    UrlEncoded,
}

impl BodyParserMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyParserMode::None => "none",
            BodyParserMode::Json => "json",
            BodyParserMode::Raw => "raw",
            BodyParserMode::Text => "text",
            BodyParserMode::UrlEncoded => "url-encoded",
        }
    }
}

impl fmt::Display for BodyParserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyParserMode {
    type Err = FrontendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(BodyParserMode::None),
            "json" => Ok(BodyParserMode::Json),
            "raw" => Ok(BodyParserMode::Raw),
            "text" => Ok(BodyParserMode::Text),
            "url-encoded" => Ok(BodyParserMode::UrlEncoded),
            other => Err(FrontendError::validation(
                "body_parser",
                format!("unknown body parser type: {other}"),
            )),
        }
    }
}
