//! End-to-end redirect behaviour over a real listener.

use axum::body::Body;
use axum::http::Request;
use web_frontend::{handler, RedirectSpec};

mod common;
use common::{client, frontend, get, get_as, location, static_dir, INDEX_HTML};

#[tokio::test]
async fn redirects_http_to_https_without_port() {
    let port = 28301;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https"))
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "https://localhost/");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn explicit_destination_port_is_used() {
    let port = 28302;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https").dest_port(8443))
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "https://localhost:8443/");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn host_rewrite_replaces_url() {
    let port = 28303;
    let frontend = frontend(port);
    frontend
        .set_redirect(
            RedirectSpec::new()
                .dest_host("example.com")
                .dest_protocol("https")
                .dest_url("/"),
        )
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/anything").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "https://example.com/");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn same_origin_rewrite_keeps_source_port() {
    let port = 28304;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().match_url("^/old").dest_url("/new"))
        .unwrap();
    frontend.start().await.unwrap();

    let client = client();
    let res = get(&client, port, "/old/page?x=1").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), format!("http://localhost:{port}/new"));

    let res = get(&client, port, "/other").await;
    assert_eq!(res.status(), 404);

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn redirects_based_on_source_host() {
    let port = 28305;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https").match_host("localhost"))
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "https://localhost/");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn non_matching_host_passes_through_to_static() {
    let port = 28306;
    let dir = static_dir();
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https").match_host("google\\.com"))
        .unwrap();
    frontend.add_static("/", dir.path()).unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/").await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), INDEX_HTML);

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn serves_static_and_redirects_everything_else() {
    let port = 28307;
    let dir = static_dir();
    let frontend = frontend(port);
    frontend.add_static("/static", dir.path()).unwrap();
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https"))
        .unwrap();
    frontend.start().await.unwrap();

    let client = client();
    let res = get(&client, port, "/static/index.html").await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), INDEX_HTML);

    let res = get(&client, port, "/foo.html").await;
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "https://localhost/foo.html");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn temporary_rule_answers_307() {
    let port = 28308;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https").temporary(true))
        .unwrap();
    frontend.start().await.unwrap();

    let res = get(&client(), port, "/cart").await;
    assert_eq!(res.status(), 307);
    assert_eq!(location(&res), "https://localhost/cart");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn predicate_gates_the_rule() {
    let port = 28309;
    let frontend = frontend(port);
    frontend
        .set_redirect(
            RedirectSpec::new()
                .match_fn(|req: &Request<Body>| req.headers().contains_key("x-legacy-client"))
                .dest_host("legacy.example.com"),
        )
        .unwrap();
    frontend
        .add_dynamic("/", "get", handler(|_req| async { "modern" }))
        .unwrap();
    frontend.start().await.unwrap();

    let client = client();
    let res = client
        .get(format!("http://127.0.0.1:{port}/"))
        .header("host", format!("localhost:{port}"))
        .header("x-legacy-client", "1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 301);
    assert_eq!(location(&res), "http://legacy.example.com/");

    let res = get(&client, port, "/").await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "modern");

    frontend.shutdown().await.unwrap();
}

#[tokio::test]
async fn first_registered_rule_wins() {
    let port = 28310;
    let frontend = frontend(port);
    frontend
        .set_redirect(RedirectSpec::new().match_host("^www\\.").dest_host("example.com"))
        .unwrap();
    frontend
        .set_redirect(RedirectSpec::new().dest_protocol("https"))
        .unwrap();
    frontend.start().await.unwrap();

    let client = client();
    let res = get_as(&client, &format!("www.example.com:{port}"), port, "/a").await;
    assert_eq!(location(&res), "http://example.com/a");

    let res = get(&client, port, "/a").await;
    assert_eq!(location(&res), "https://localhost/a");

    frontend.shutdown().await.unwrap();
}
