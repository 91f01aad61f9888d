//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store registered mounts in registration order
//! - Hand each request to the first mount that answers it
//! - Answer 404 when nothing does
//!
//! # Design Decisions
//! - Immutable after start (shared via `Arc`, no locks)
//! - Redirect rules, static and dynamic mounts interleave exactly as
//!   registered, so a static mount ahead of a catch-all redirect still serves
//! - A static miss falls through instead of ending the chain

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::routing::mount::Mount;

/// The frozen route table.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    mounts: Arc<[Mount]>,
}

impl MountTable {
    pub fn new(mounts: Vec<Mount>) -> Self {
        Self {
            mounts: mounts.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Number of redirect rules in the table.
    pub fn redirect_count(&self) -> usize {
        self.mounts
            .iter()
            .filter(|mount| matches!(mount, Mount::Redirect(_)))
            .count()
    }

    pub async fn dispatch(&self, mut request: Request<Body>) -> Response {
        for mount in self.mounts.iter() {
            match mount {
                Mount::Redirect(engine) => {
                    if let Some(redirect) = engine.evaluate(&request) {
                        metrics::record_redirect(redirect.status().as_u16());
                        return redirect.into_response();
                    }
                }
                Mount::Static(mount) => {
                    let Some(inner) = mount.file_request(&request) else {
                        continue;
                    };
                    if let Some(response) = mount.serve(inner).await {
                        return response;
                    }
                }
                Mount::Dynamic(route) => {
                    if let Some(params) = route.matches(request.method(), request.uri().path()) {
                        tracing::debug!(route = %route.path(), "Dispatching to handler");
                        request.extensions_mut().insert(params);
                        return route.call(request).await;
                    }
                }
            }
        }
        not_found(&request)
    }
}

fn not_found(request: &Request<Body>) -> Response {
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        format!("Cannot {} {}", request.method(), request.uri().path()),
    )
        .into_response()
}

/// Fallback handler feeding every request through the table.
pub async fn route_request(State(table): State<MountTable>, request: Request<Body>) -> Response {
    table.dispatch(request).await
}
