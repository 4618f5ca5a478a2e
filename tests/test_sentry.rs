//! tests/test_sentry.rs
//!
//! Exception-tracker plugin: DSN parsing, event capture and delivery against a
//! local mock server.

use rs_log_ng::loggers::MemoryLogger;
use rs_log_ng::plugins::sentry::{AUTH_HEADER, Endpoint, ExceptionEvent};
use rs_log_ng::{
    BackendOptions, ErrorValue, InitArgs, LogContext, LogError, LogHandle, LogLevel, Message,
    Settings, fields,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Context with the built-in plugins, an in-memory backend and `sentry` enabled.
fn sentry_context(endpoint: String) -> (LogContext, MemoryLogger) {
    let settings = Settings {
        plugins: "sentry".into(),
        error_endpoint: Some(endpoint),
        ..Settings::default()
    };
    let ctx = LogContext::new(settings);
    let backend = MemoryLogger::new("sentry-test");
    let shared = backend.clone();
    ctx.set_logger(move |opts: &BackendOptions| {
        Ok(Arc::new(shared.clone().with_level(opts.level)) as Arc<dyn LogHandle>)
    });
    (ctx, backend)
}

/// Polls the mock server until `count` requests arrived or five seconds passed.
async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
    for _ in 0..250 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

// =========================================================================
// ENDPOINT PARSING
// =========================================================================

#[test]
fn plain_url_is_used_as_is() {
    let endpoint = Endpoint::parse("https://errors.example.com/ingest").unwrap();
    assert_eq!(endpoint.url.as_str(), "https://errors.example.com/ingest");
    assert!(endpoint.auth.is_none());
}

#[test]
fn dsn_becomes_store_url_with_auth() {
    let endpoint = Endpoint::parse("https://abc123@o1.ingest.example.com/prefix/42").unwrap();

    assert_eq!(endpoint.url.as_str(), "https://o1.ingest.example.com/prefix/api/42/store/");
    let auth = endpoint.auth.unwrap();
    assert!(auth.starts_with("Sentry sentry_version=7"));
    assert!(auth.contains("sentry_key=abc123"));
    assert!(!auth.contains("sentry_secret"));
}

#[test]
fn dsn_without_project_is_rejected() {
    assert!(matches!(Endpoint::parse("https://key@host.example.com/"), Err(LogError::ConfigError(_))));
    assert!(matches!(Endpoint::parse("not a url"), Err(LogError::ConfigError(_))));
}

// =========================================================================
// EVENT CAPTURE
// =========================================================================

#[test]
fn error_messages_are_captured_directly() {
    let err = ErrorValue::new("IoError", "disk full").with_stack(Some("caused by: quota".into()));
    let data = fields(json!({"volume": "/var"}));

    let event = ExceptionEvent::capture(&data, &Message::Error(err));

    assert_eq!(event.event_id.len(), 32);
    assert_eq!(event.level, LogLevel::Error);
    assert_eq!(event.exception.values[0].kind, "IoError");
    assert_eq!(event.exception.values[0].value, "disk full");
    assert_eq!(event.exception.values[0].stacktrace.as_deref(), Some("caused by: quota"));
    assert_eq!(event.extra, data);
}

#[test]
fn text_messages_take_stack_from_data() {
    let data = fields(json!({"stack": "at handler (app.rs:10)"}));

    let event = ExceptionEvent::capture(&data, &Message::from("request failed"));

    assert_eq!(event.exception.values[0].kind, "Error");
    assert_eq!(event.exception.values[0].value, "request failed");
    assert_eq!(event.exception.values[0].stacktrace.as_deref(), Some("at handler (app.rs:10)"));

    let no_stack = ExceptionEvent::capture(&Default::default(), &Message::from("plain"));
    assert!(no_stack.exception.values[0].stacktrace.is_none());
}

// =========================================================================
// DELIVERY
// =========================================================================

#[tokio::test]
async fn error_dispatch_posts_one_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (ctx, backend) = sentry_context(server.uri());
    let log = ctx.init(InitArgs::new("sentry")).unwrap();

    log.log("info", "not reported", Default::default());
    log.log("error", "reported", fields(json!({"order": 7})));

    let received = wait_for_requests(&server, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["level"], json!("error"));
    assert_eq!(body["exception"]["values"][0]["value"], json!("reported"));
    assert_eq!(body["extra"]["order"], json!(7));

    assert_eq!(backend.entries().len(), 2, "backend still receives both records");
}

#[tokio::test]
async fn error_objects_are_reported_with_their_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (ctx, _backend) = sentry_context(server.uri());
    let log = ctx.init(InitArgs::new("sentry")).unwrap();
    let io = std::io::Error::new(std::io::ErrorKind::Other, "oh man this is an error");

    log.report(&io);

    let received = wait_for_requests(&server, 1).await;
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["exception"]["values"][0]["type"], json!("Error"));
    assert_eq!(body["exception"]["values"][0]["value"], json!("oh man this is an error"));
}

#[tokio::test]
async fn dsn_posts_to_store_endpoint_with_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/42/store/"))
        .and(header_exists(AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dsn = format!("http://publickey@{}/42", server.address());
    let (ctx, _backend) = sentry_context(dsn);
    let log = ctx.init(InitArgs::new("sentry")).unwrap();

    log.log("error", "through dsn", Default::default());

    let received = wait_for_requests(&server, 1).await;
    let auth = received[0].headers.get(AUTH_HEADER).unwrap().to_str().unwrap();
    assert!(auth.contains("sentry_key=publickey"));
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (ctx, _backend) = sentry_context(server.uri());
    let log = ctx.init(InitArgs::new("sentry")).unwrap();

    log.log("error", "flaky tracker", Default::default());

    let received = wait_for_requests(&server, 2).await;
    assert_eq!(received.len(), 2, "one failed attempt plus one retry");
}

#[test]
fn sentry_without_runtime_is_dropped_and_reported() {
    let (ctx, backend) = sentry_context("http://127.0.0.1:9/".into());
    let log = ctx.init(InitArgs::new("sentry")).unwrap();

    log.log("error", "still logged", Default::default());

    let entries = backend.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].data.get("plugin"), Some(&json!("sentry")));
    assert_eq!(entries[1].msg.text(), "still logged");
    assert!(ctx.pipeline().unwrap().is_identity());
}
