//! Listener binding and the running-server handle.
//!
//! # Responsibilities
//! - Bind the listen socket up front so bind failures surface at start
//! - Serve the router over plain TCP or rustls
//! - Close the listener with a bounded graceful drain

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::{FrontendError, Result};

/// Bind `addr`, returning a non-blocking std listener ready for the server.
pub async fn bind(addr: SocketAddr) -> Result<std::net::TcpListener> {
    let bind_err = |source| FrontendError::Bind { addr, source };
    let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;
    tracing::info!(address = %local_addr, "Listener bound");
    listener.into_std().map_err(bind_err)
}

/// A bound, serving listener.
#[derive(Debug)]
pub struct ListenerHandle {
    handle: Handle,
    task: JoinHandle<io::Result<()>>,
    local_addr: SocketAddr,
    grace: Duration,
}

impl ListenerHandle {
    /// Start serving `app` on an already bound listener.
    pub fn serve(
        listener: std::net::TcpListener,
        app: Router,
        tls: Option<RustlsConfig>,
        grace: Duration,
    ) -> Result<Self> {
        let local_addr = listener.local_addr().map_err(|source| FrontendError::Bind {
            addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            source,
        })?;
        let handle = Handle::new();
        let service = app.into_make_service_with_connect_info::<SocketAddr>();

        let task = match tls {
            Some(config) => tokio::spawn(
                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle.clone())
                    .serve(service),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(listener)
                    .handle(handle.clone())
                    .serve(service),
            ),
        };

        Ok(Self {
            handle,
            task,
            local_addr,
            grace,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Open connections, as tracked by the server runtime.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Stop accepting, let in-flight requests finish within the grace
    /// period, and wait for the server task to exit.
    pub async fn close(self) -> io::Result<()> {
        tracing::debug!(address = %self.local_addr, grace = ?self.grace, "Closing listener");
        self.handle.graceful_shutdown(Some(self.grace));
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        }
    }

    /// Close immediately without draining.
    pub fn abort(&self) {
        self.handle.shutdown();
    }
}
