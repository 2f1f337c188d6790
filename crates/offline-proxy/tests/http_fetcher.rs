//! HTTP fetcher and full worker tests against a mock origin.

use std::sync::Arc;
use std::time::Duration;

use offline_proxy::{
    Fetcher, HttpFetcher, Lifecycle, MemoryStorage, OfflineWorker, ProxyConfig, ProxyError,
    ResourceIdentity, RouteSource, PROXY_USER_AGENT,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn id(input: &str) -> ResourceIdentity {
    ResourceIdentity::parse(input).unwrap()
}

fn fetcher(server: &MockServer) -> HttpFetcher {
    HttpFetcher::with_origin(&server.uri(), 5, 0).unwrap()
}

#[tokio::test]
async fn test_fetch_success_keeps_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/cached.html"))
        .and(header("user-agent", PROXY_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .insert_header("X-Build", "42")
                .set_body_string("<h1>cached</h1>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let artifact = fetcher(&mock_server)
        .fetch(&id("/pages/cached.html"))
        .await
        .unwrap();

    assert_eq!(artifact.status, 200);
    assert_eq!(artifact.text(), "<h1>cached</h1>");
    assert_eq!(artifact.content_type(), Some("text/html"));
    assert_eq!(artifact.header("x-build"), Some("42"));
}

#[tokio::test]
async fn test_fetch_forwards_query_and_method() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/form"))
        .and(query_param("step", "2"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = id("/api/form?step=2").with_method("post").unwrap();
    let artifact = fetcher(&mock_server).fetch(&request).await.unwrap();

    assert_eq!(artifact.status, 201);
    assert_eq!(artifact.text(), "created");
}

#[tokio::test]
async fn test_fetch_404_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&mock_server)
        .await;

    let artifact = fetcher(&mock_server).fetch(&id("/missing")).await.unwrap();

    assert_eq!(artifact.status, 404);
    assert_eq!(artifact.text(), "nope");
}

#[tokio::test]
async fn test_fetch_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_origin(&mock_server.uri(), 5, 3).unwrap();
    let artifact = fetcher.fetch(&id("/broken")).await.unwrap();

    assert_eq!(artifact.status, 503);
}

#[tokio::test]
async fn test_fetch_unreachable_origin_is_network_error() {
    let fetcher = HttpFetcher::with_origin("http://127.0.0.1:1", 2, 0).unwrap();

    let err = fetcher.fetch(&id("/index.html")).await.unwrap_err();

    assert!(matches!(err, ProxyError::Network { .. }), "{:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_origin(&mock_server.uri(), 1, 0).unwrap();
    let err = fetcher.fetch(&id("/slow")).await.unwrap_err();

    assert!(matches!(err, ProxyError::Timeout { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_timed_out_post_is_sent_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_origin(&mock_server.uri(), 1, 2).unwrap();
    let request = id("/api/submit").with_method("POST").unwrap();
    let err = fetcher.fetch(&request).await.unwrap_err();

    assert!(matches!(err, ProxyError::Timeout { .. }), "{:?}", err);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_timed_out_get_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_origin(&mock_server.uri(), 1, 1).unwrap();
    let err = fetcher.fetch(&id("/slow")).await.unwrap_err();

    assert!(matches!(err, ProxyError::Timeout { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_origin_with_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("home"))
        .mount(&mock_server)
        .await;

    let origin = format!("{}/", mock_server.uri());
    let fetcher = HttpFetcher::with_origin(&origin, 5, 0).unwrap();

    assert_eq!(fetcher.origin(), mock_server.uri());
    let artifact = fetcher.fetch(&id("/index.html")).await.unwrap();
    assert_eq!(artifact.text(), "home");
}

#[test]
fn test_invalid_origin_rejected() {
    assert!(matches!(
        HttpFetcher::with_origin("not a url", 5, 0),
        Err(ProxyError::Config { .. })
    ));
    assert!(matches!(
        HttpFetcher::with_origin("ftp://example.com", 5, 0),
        Err(ProxyError::Config { .. })
    ));
}

async fn mount_site(server: &MockServer) {
    for (p, body) in [
        ("/index.html", "home"),
        ("/404.html", "not found page"),
        ("/offline.html", "offline page"),
        ("/no-cache.html", "live"),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("raw 404"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_worker_against_mock_origin() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    // Mock servers listen on 127.0.0.1, so the base path is not applied.
    let config = ProxyConfig::default()
        .with_origin(mock_server.uri())
        .with_manifest(["/index.html", "/404.html", "/offline.html"])
        .with_exclude(["/no-cache.html"])
        .with_fallbacks("/404.html", "/offline.html");
    let worker = OfflineWorker::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(HttpFetcher::new(&config).unwrap()),
        config.deployment().unwrap(),
    );

    let installed = worker.on_install().await.unwrap();
    assert_eq!(installed.cached.len(), 3);
    worker.on_activate().await.unwrap();

    let home = worker.on_intercept(&id("/index.html")).await;
    assert_eq!(home.source, RouteSource::Cache);
    assert_eq!(home.artifact.text(), "home");

    let missing = worker.on_intercept(&id("/does-not-exist")).await;
    assert_eq!(missing.artifact.text(), "not found page");

    let live = worker.on_intercept(&id("/no-cache.html")).await;
    assert_eq!(live.source, RouteSource::Passthrough);
    assert_eq!(live.artifact.text(), "live");
}

#[tokio::test]
async fn test_worker_survives_origin_shutdown() {
    // Not pooled: dropping it closes the listener.
    let mock_server = MockServer::builder().start().await;
    mount_site(&mock_server).await;

    let config = ProxyConfig::default()
        .with_origin(mock_server.uri())
        .with_manifest(["/index.html", "/404.html", "/offline.html"])
        .with_exclude(["/no-cache.html"])
        .with_fallbacks("/404.html", "/offline.html");
    let storage = Arc::new(MemoryStorage::new());
    let worker = OfflineWorker::new(
        storage,
        Arc::new(HttpFetcher::new(&config).unwrap()),
        config.deployment().unwrap(),
    );
    worker.on_install().await.unwrap();
    worker.on_activate().await.unwrap();

    drop(mock_server);

    let home = worker.on_intercept(&id("/index.html")).await;
    assert_eq!(home.source, RouteSource::Cache);

    let unknown = worker.on_intercept(&id("/elsewhere")).await;
    assert_eq!(unknown.artifact.text(), "not found page");

    let live = worker.on_intercept(&id("/no-cache.html")).await;
    assert_eq!(live.artifact.text(), "offline page");
}
