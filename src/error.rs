//! Error taxonomy for the front-end.
//!
//! Every configuration-time failure is synchronous and leaves prior state
//! untouched. Per-request redirect evaluation never produces one of these.

use thiserror::Error;

/// Errors raised by the configuration gate and the front-end service.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// An argument had the wrong type or shape.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// A mutator or registration was attempted after the listener bound.
    #[error("can't {action} after server has started")]
    AlreadyStarted { action: &'static str },

    /// A collaborator required at start was not installed.
    #[error("{0} not found")]
    DependencyMissing(&'static str),

    /// A redirect rule was built without any destination field.
    #[error("redirect rule needs at least one of dest_protocol, dest_host, dest_port, dest_url")]
    Configuration,

    /// Certificate material was present but unusable.
    #[error("TLS material rejected: {0}")]
    Tls(String),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Shutdown was requested for a service that never started.
    #[error("server is not running")]
    NotStarted,
}

impl FrontendError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = FrontendError> = std::result::Result<T, E>;
