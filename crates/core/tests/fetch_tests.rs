//! Fetch engine tests against a local axum server
#![cfg(feature = "fetch")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use gleaner_core::*;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

const OK_BODY: &str = "<html><head><title>Ok page</title></head><body><p>Enough paragraph text to count as content.</p></body></html>";

type Hits = Arc<Mutex<HashMap<String, u32>>>;

struct TestServer {
    base: String,
    hits: Hits,
}

impl TestServer {
    async fn start() -> Self {
        let hits: Hits = Arc::default();
        let app = Router::new().fallback(respond).with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base, hits }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn hits(&self, path: &str) -> u32 {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn respond(State(hits): State<Hits>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let count = {
        let mut hits = hits.lock().unwrap();
        let entry = hits.entry(path.clone()).or_insert(0);
        *entry += 1;
        *entry
    };

    match path.as_str() {
        "/ok" => (StatusCode::OK, OK_BODY).into_response(),
        "/empty" => (StatusCode::OK, "   \n").into_response(),
        "/bare" => (StatusCode::OK, "<html><body><div> </div></body></html>").into_response(),
        "/error" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "/missing" => StatusCode::NOT_FOUND.into_response(),
        "/private" => StatusCode::UNAUTHORIZED.into_response(),
        "/forbidden" => StatusCode::FORBIDDEN.into_response(),
        "/throttled" => (StatusCode::FORBIDDEN, [(header::RETRY_AFTER, "1")], "slow down").into_response(),
        "/busy" => StatusCode::TOO_MANY_REQUESTS.into_response(),
        "/gone" => StatusCode::GONE.into_response(),
        "/flaky" if count == 1 => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "/flaky" => (StatusCode::OK, OK_BODY).into_response(),
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, OK_BODY).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_unit: Duration::from_millis(1),
        cooldown_base: Duration::from_millis(1),
        cooldown_step: Duration::from_millis(1),
    }
}

fn fetcher(max_retries: u32) -> Fetcher {
    Fetcher::new(FetchConfig { timeout: Duration::from_millis(500), retry: fast_policy(max_retries), ..Default::default() })
}

#[tokio::test]
async fn test_success_first_attempt() {
    let server = TestServer::start().await;
    let fetcher = fetcher(3);

    let page = fetcher.fetch(&server.url("/ok")).await.unwrap();
    assert_eq!(page.body, OK_BODY);
    assert_eq!(page.status, 200);
    assert_eq!(page.attempts, 1);
    assert_eq!(server.hits("/ok"), 1);
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let server = TestServer::start().await;
    let fetcher = fetcher(3);

    let err = fetcher.fetch(&server.url("/error")).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ServerError);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.last_status, Some(500));
    assert_eq!(server.hits("/error"), 3);
    assert!(!fetcher.session().is_open().await, "exhaustion closes the session");
}

#[rstest]
#[case("/missing", 404)]
#[case("/private", 401)]
#[case("/forbidden", 403)]
#[tokio::test]
async fn test_client_errors_are_not_retried(#[case] path: &str, #[case] status: u16) {
    let server = TestServer::start().await;
    let fetcher = fetcher(3);

    let err = fetcher.fetch(&server.url(path)).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::ClientError);
    assert_eq!(err.attempts, 1);
    assert_eq!(err.last_status, Some(status));
    assert_eq!(server.hits(path), 1);
    assert!(fetcher.session().is_open().await);
}

#[rstest]
#[case("/busy", 429)]
#[case("/throttled", 403)]
#[tokio::test]
async fn test_rate_limited_retries_then_fails(#[case] path: &str, #[case] status: u16) {
    let server = TestServer::start().await;
    let fetcher = fetcher(3);

    let err = fetcher.fetch(&server.url(path)).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::RateLimited);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.last_status, Some(status));
    assert_eq!(server.hits(path), 3);
}

#[tokio::test]
async fn test_other_client_error_retried() {
    let server = TestServer::start().await;
    let err = fetcher(2).fetch(&server.url("/gone")).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::ClientError);
    assert_eq!(err.attempts, 2);
    assert_eq!(server.hits("/gone"), 2);
}

#[tokio::test]
async fn test_blank_body_is_empty_response() {
    let server = TestServer::start().await;
    let err = fetcher(3).fetch(&server.url("/empty")).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::EmptyResponse);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.last_status, Some(200));
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let server = TestServer::start().await;
    let page = fetcher(3).fetch(&server.url("/flaky")).await.unwrap();

    assert_eq!(page.attempts, 2);
    assert_eq!(page.body, OK_BODY);
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let server = TestServer::start().await;
    let fetcher = Fetcher::new(FetchConfig {
        timeout: Duration::from_millis(100),
        retry: fast_policy(2),
        ..Default::default()
    });

    let err = fetcher.fetch(&server.url("/slow")).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Timeout);
    assert_eq!(err.attempts, 2);
    assert_eq!(err.last_status, None);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let err = fetcher(2).fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::TransportError);
    assert_eq!(err.attempts, 2);
}

#[tokio::test]
async fn test_explicit_retry_budget() {
    let server = TestServer::start().await;
    let err = fetcher(3).fetch_with_retries(&server.url("/error"), 5).await.unwrap_err();

    assert_eq!(err.attempts, 5);
    assert_eq!(server.hits("/error"), 5);
}

#[tokio::test]
async fn test_cancel_during_backoff() {
    let server = TestServer::start().await;
    let fetcher = Fetcher::new(FetchConfig {
        retry: RetryPolicy { backoff_unit: Duration::from_secs(10), ..fast_policy(3) },
        ..Default::default()
    });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = fetcher.fetch_cancellable(&server.url("/error"), 3, &token).await.unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Cancelled);
    assert_eq!(err.attempts, 1);
    assert_eq!(err.last_status, Some(500));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.hits("/error"), 1);
}

#[tokio::test]
async fn test_session_reused_then_recreated() {
    let server = TestServer::start().await;
    let fetcher = fetcher(1);

    fetcher.fetch(&server.url("/ok")).await.unwrap();
    fetcher.fetch(&server.url("/ok")).await.unwrap();
    assert_eq!(fetcher.session().generation(), 1);

    fetcher.fetch(&server.url("/error")).await.unwrap_err();
    assert!(!fetcher.session().is_open().await);

    fetcher.fetch(&server.url("/ok")).await.unwrap();
    assert_eq!(fetcher.session().generation(), 2);
}

#[tokio::test]
async fn test_concurrent_fetches_share_pool() {
    let server = TestServer::start().await;
    let fetcher = Arc::new(Fetcher::new(FetchConfig {
        max_connections: 3,
        retry: fast_policy(1),
        ..Default::default()
    }));
    let url = server.url("/ok");

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let fetcher = fetcher.clone();
            let url = url.clone();
            tokio::spawn(async move { fetcher.fetch(&url).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().body, OK_BODY);
    }
    assert_eq!(server.hits("/ok"), 12);
    assert_eq!(fetcher.session().generation(), 1);
}

#[tokio::test]
async fn test_glean_pipeline() {
    let server = TestServer::start().await;
    let config = GleanerConfig::builder().retry_policy(fast_policy(2)).build();
    let gleaner = Gleaner::with_config(config);

    let record = gleaner.glean(&server.url("/ok")).await.unwrap();
    assert_eq!(record.title, "Ok page");
    assert_eq!(record.paragraphs, vec!["Enough paragraph text to count as content."]);

    let err = gleaner.glean(&server.url("/bare")).await.unwrap_err();
    assert!(matches!(err, GleanerError::NoUsableContent));
    assert_eq!(err.to_string(), "no usable content found");

    let err = gleaner.glean(&server.url("/missing")).await.unwrap_err();
    assert!(matches!(err, GleanerError::Fetch(ref e) if e.kind == FetchErrorKind::ClientError));

    gleaner.shutdown().await;
    assert!(!gleaner.fetcher().session().is_open().await);
}
