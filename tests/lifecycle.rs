//! Start/stop behaviour and the post-start configuration fence.

use std::time::Duration;

use web_frontend::{handler, BodyParserMode, FrontEnd, FrontendError, Phase, RedirectSpec};

mod common;
use common::{client, frontend, get, self_signed, static_dir, tls_client, LOCALHOST};

fn is_already_started<T: std::fmt::Debug>(result: Result<T, FrontendError>) -> bool {
    matches!(result, Err(FrontendError::AlreadyStarted { .. }))
}

#[tokio::test]
async fn every_mutator_is_fenced_after_start() {
    let port = 28321;
    let dir = static_dir();
    let frontend = frontend(port);
    frontend.set_domain("example.com").unwrap();
    let addr = frontend.start().await.unwrap();
    assert_eq!(addr.port(), port);
    assert_eq!(frontend.phase(), Phase::Running);

    assert!(is_already_started(frontend.set_port(9999)));
    assert!(is_already_started(frontend.set_domain("other.com")));
    assert!(is_already_started(frontend.set_https(true)));
    assert!(is_already_started(frontend.set_body_parser(BodyParserMode::Json)));
    assert!(is_already_started(frontend.set_enable_session(true)));
    assert!(is_already_started(frontend.gate().set_security_headers(false)));
    assert!(is_already_started(
        frontend.set_redirect(RedirectSpec::new().dest_protocol("https"))
    ));
    assert!(is_already_started(frontend.add_static("/static", dir.path())));
    assert!(is_already_started(
        frontend.add_dynamic("/late", "get", handler(|_req| async { "late" }))
    ));
    assert!(is_already_started(frontend.start().await));

    assert_eq!(frontend.port(), Some(port));
    assert_eq!(frontend.domain().as_deref(), Some("example.com"));
    assert_eq!(frontend.protocol(), "http");

    // Nothing registered after start is served.
    let res = get(&client(), port, "/late").await;
    assert_eq!(res.status(), 404);

    frontend.shutdown().await.unwrap();
    assert_eq!(frontend.phase(), Phase::Stopped);
    assert!(is_already_started(frontend.set_port(9999)));
    assert!(matches!(frontend.shutdown().await, Err(FrontendError::NotStarted)));
}

#[tokio::test]
async fn error_message_names_the_action() {
    let frontend = frontend(28322);
    frontend.start().await.unwrap();
    let err = frontend.set_port(1).unwrap_err();
    assert_eq!(err.to_string(), "can't set port after server has started");
    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn bind_failure_leaves_frontend_configurable() {
    let taken = std::net::TcpListener::bind((LOCALHOST, 28323)).unwrap();
    let frontend = frontend(28323);

    match frontend.start().await {
        Err(FrontendError::Bind { addr, .. }) => assert_eq!(addr.port(), 28323),
        other => panic!("expected bind failure, got {other:?}"),
    }
    assert_eq!(frontend.phase(), Phase::Configuring);
    assert!(frontend.local_addr().is_none());

    frontend.set_port(28324).unwrap();
    let addr = frontend.start().await.unwrap();
    assert_eq!(addr.port(), 28324);
    assert_eq!(frontend.local_addr(), Some(addr));

    frontend.shutdown().await.unwrap();
    drop(taken);
}

#[tokio::test]
async fn tls_requires_a_certificate_provider() {
    let frontend = frontend(28325);
    frontend.set_https(true).unwrap();
    assert_eq!(frontend.protocol(), "https");

    let err = frontend.start().await.unwrap_err();
    assert!(matches!(err, FrontendError::DependencyMissing(_)));
    assert_eq!(err.to_string(), "certificate provider not found");
    assert_eq!(frontend.phase(), Phase::Configuring);
}

#[tokio::test]
async fn unusable_certificate_is_rejected_at_start() {
    let frontend = frontend(28326);
    frontend.set_https(true).unwrap();
    frontend
        .set_certificate_provider(web_frontend::TlsMaterial::from_pem("not a cert", "not a key"))
        .unwrap();
    assert!(matches!(frontend.start().await, Err(FrontendError::Tls(_))));
    assert_eq!(frontend.phase(), Phase::Configuring);
}

#[tokio::test]
async fn serves_https_with_secure_session_cookie() {
    let port = 28327;
    let frontend = frontend(port);
    frontend.set_https(true).unwrap();
    frontend.set_enable_session(true).unwrap();
    frontend.set_certificate_provider(self_signed()).unwrap();
    frontend
        .add_dynamic("/", "get", handler(|_req| async { "secure" }))
        .unwrap();
    frontend.start().await.unwrap();

    let res = tls_client(port)
        .get(format!("https://localhost:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.ends_with("; Secure"));
    assert!(res
        .headers()
        .get("strict-transport-security")
        .is_some());
    assert_eq!(res.text().await.unwrap(), "secure");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_releases_the_port() {
    let port = 28328;
    let frontend = frontend(port);
    frontend.start().await.unwrap();
    frontend.shutdown().await.unwrap();

    let rebound = std::net::TcpListener::bind((LOCALHOST, port));
    assert!(rebound.is_ok());
}

#[tokio::test]
async fn shutdown_drains_in_flight_requests() {
    let port = 28329;
    let frontend = frontend(port);
    frontend.gate().set_shutdown_grace(Duration::from_secs(5)).unwrap();
    frontend
        .add_dynamic(
            "/slow",
            "get",
            handler(|_req| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }),
        )
        .unwrap();
    frontend.start().await.unwrap();

    let request = tokio::spawn(async move { get(&client(), port, "/slow").await.text().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    frontend.shutdown().await.unwrap();

    assert_eq!(request.await.unwrap().unwrap(), "done");
}

#[tokio::test]
async fn configured_through_commands() {
    let port = 28330;
    let frontend = FrontEnd::new();
    frontend.gate().set_bind_ip(LOCALHOST).unwrap();
    frontend.configure("set-port", serde_json::json!(port)).unwrap();
    frontend
        .configure("set-redirect", serde_json::json!({"destProtocol": "https", "destPort": 8443}))
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/x").await;
    assert_eq!(common::location(&res), "https://localhost:8443/x");

    assert!(is_already_started(
        frontend.configure("set-domain", serde_json::json!("late.example.com"))
    ));
    frontend.shutdown().await.unwrap();
}
