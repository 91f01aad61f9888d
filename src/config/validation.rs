//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports non-zero, limits positive)
//! - Check redirect rules carry a destination and compile
//! - Check TLS has certificate paths when enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FrontendConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is applied to the gate

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use regex::Regex;

use crate::config::schema::FrontendConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed config, collecting every error.
pub fn validate_config(config: &FrontendConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_ip.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_ip",
            format!("'{}' is not an IP address", config.listener.bind_ip),
        ));
    }
    if config.listener.port == Some(0) {
        errors.push(ValidationError::new("listener.port", "must be between 1 and 65535"));
    }

    if config.tls.enabled {
        if config.tls.cert_path.is_none() {
            errors.push(ValidationError::new("tls.cert_path", "required when tls.enabled = true"));
        }
        if config.tls.key_path.is_none() {
            errors.push(ValidationError::new("tls.key_path", "required when tls.enabled = true"));
        }
    }

    if config.http.body_limit == 0 {
        errors.push(ValidationError::new("http.body_limit", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    for (i, rule) in config.redirects.iter().enumerate() {
        let blank = |field: &Option<String>| field.as_deref().map_or(true, str::is_empty);
        if blank(&rule.dest_protocol)
            && blank(&rule.dest_host)
            && rule.dest_port.is_none()
            && blank(&rule.dest_url)
        {
            errors.push(ValidationError::new(
                format!("redirects[{i}]"),
                "needs at least one of dest_protocol, dest_host, dest_port, dest_url",
            ));
        }
        if rule.dest_port == Some(0) {
            errors.push(ValidationError::new(format!("redirects[{i}].dest_port"), "must be non-zero"));
        }
        for (name, pattern) in [("match_host", &rule.match_host), ("match_url", &rule.match_url)] {
            if let Some(pattern) = pattern {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(ValidationError::new(format!("redirects[{i}].{name}"), e.to_string()));
                }
            }
        }
    }

    for (i, mount) in config.statics.iter().enumerate() {
        if !mount.path.starts_with('/') {
            errors.push(ValidationError::new(format!("statics[{i}].path"), "must start with '/'"));
        }
        if mount.dir.is_empty() {
            errors.push(ValidationError::new(format!("statics[{i}].dir"), "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
