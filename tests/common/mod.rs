//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use reqwest::header::HOST;
use reqwest::redirect::Policy;
use tempfile::TempDir;
use web_frontend::{FrontEnd, TlsMaterial};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

pub const INDEX_HTML: &str = "<html>hi</html>";

/// A front-end bound to loopback on `port`.
pub fn frontend(port: u16) -> FrontEnd {
    let frontend = FrontEnd::new();
    frontend.gate().set_bind_ip(LOCALHOST).unwrap();
    frontend.set_port(port).unwrap();
    frontend
}

/// Plain client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// TLS client trusting any certificate, with `localhost` pinned to loopback.
pub fn tls_client(port: u16) -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .danger_accept_invalid_certs(true)
        .resolve("localhost", SocketAddr::new(LOCALHOST, port))
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// GET `path` over loopback, presenting `localhost:{port}` as the host.
pub async fn get(client: &reqwest::Client, port: u16, path: &str) -> reqwest::Response {
    get_as(client, &format!("localhost:{port}"), port, path).await
}

/// GET `path` over loopback with an arbitrary `Host` header.
pub async fn get_as(client: &reqwest::Client, host: &str, port: u16, path: &str) -> reqwest::Response {
    client
        .get(format!("http://127.0.0.1:{port}{path}"))
        .header(HOST, host)
        .send()
        .await
        .expect("front-end unreachable")
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// A directory holding `index.html`.
pub fn static_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    dir
}

pub fn self_signed() -> TlsMaterial {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    TlsMaterial::from_pem(cert.pem(), key_pair.serialize_pem())
}
