//! `sentry`: forwards error-level records to an exception tracker.
//!
//! The side effect only builds an [`ExceptionEvent`] and queues it; a
//! [`ReportWorker`] on the tokio runtime posts events with transient-failure
//! retries. Queue overflow drops events.

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::loggers::core::{ErrorValue, Fields, LogLevel, Message};
use crate::plugins::enrich::Enrichment;

pub const EVENT_BUFFER: usize = 256;
pub const MAX_RETRIES: u32 = 2;
pub const RETRY_MIN: Duration = Duration::from_millis(100);
pub const RETRY_MAX: Duration = Duration::from_secs(10);
pub const AUTH_HEADER: &str = "x-sentry-auth";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionList {
    pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub platform: &'static str,
    pub exception: ExceptionList,
    pub extra: Fields,
}

impl ExceptionEvent {
    /// An error message is reported as-is; plain text becomes an `Error`
    /// whose stack is taken from the record's `stack` field, if any.
    pub fn capture(data: &Fields, msg: &Message) -> Self {
        let err = match msg {
            Message::Error(err) => err.clone(),
            Message::Text(text) => ErrorValue::new("Error", text.clone()).with_stack(
                data.get("stack")
                    .and_then(|s| s.as_str())
                    .map(str::to_string),
            ),
        };

        Self {
            event_id: hex::encode(rand::random::<[u8; 16]>()),
            timestamp: Utc::now(),
            level: LogLevel::Error,
            platform: "other",
            exception: ExceptionList {
                values: vec![ExceptionValue {
                    kind: err.kind,
                    value: err.message,
                    stacktrace: err.stack,
                }],
            },
            extra: data.clone(),
        }
    }
}

/// Where events go. A Sentry DSN is turned into its store URL plus auth header.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: Url,
    pub auth: Option<String>,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, LogError> {
        let mut url = Url::parse(raw.trim())
            .map_err(|e| LogError::ConfigError(format!("Invalid error endpoint `{}`: {}", raw, e)))?;

        if url.username().is_empty() {
            return Ok(Self { url, auth: None });
        }

        let key = url.username().to_string();
        let secret = url.password().map(str::to_string);
        let path = url.path().trim_end_matches('/').to_string();
        let (prefix, project) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
        if project.is_empty() {
            return Err(LogError::ConfigError(format!("DSN `{}` has no project id", raw)));
        }

        url.set_path(&format!("{}/api/{}/store/", prefix, project));
        url.set_username("")
            .and_then(|_| url.set_password(None))
            .map_err(|_| LogError::ConfigError(format!("DSN `{}` cannot carry credentials", raw)))?;

        let mut auth = format!(
            "Sentry sentry_version=7, sentry_client=rs_log_ng/{}, sentry_key={}",
            env!("CARGO_PKG_VERSION"),
            key
        );
        if let Some(secret) = secret {
            auth.push_str(&format!(", sentry_secret={}", secret));
        }

        Ok(Self { url, auth: Some(auth) })
    }
}

#[derive(Clone)]
pub struct ExceptionReporter {
    sender: mpsc::Sender<ExceptionEvent>,
}

impl ExceptionReporter {
    /// Spawns a `ReportWorker` on the current tokio runtime.
    pub fn spawn(endpoint: Endpoint) -> Result<Self, LogError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            LogError::ConfigError("exception reporting requires a running tokio runtime".into())
        })?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let worker = ReportWorker::new(rx, endpoint, MAX_RETRIES);
        runtime.spawn(async move {
            worker.run().await;
        });

        Ok(Self { sender: tx })
    }

    pub fn report(&self, event: ExceptionEvent) {
        let _ = self.sender.try_send(event);
    }
}

pub struct ReportWorker {
    receiver: mpsc::Receiver<ExceptionEvent>,
    client: ClientWithMiddleware,
    endpoint: Endpoint,
}

impl ReportWorker {
    pub fn new(receiver: mpsc::Receiver<ExceptionEvent>, endpoint: Endpoint, max_retries: u32) -> Self {
        let policy = ExponentialBackoff::builder()
            .retry_bounds(RETRY_MIN, RETRY_MAX)
            .build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .build();

        Self { receiver, client, endpoint }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            // Reporting must not recurse into logging; failures are dropped.
            let _ = self.send(&event).await;
        }
    }

    pub async fn send(&self, event: &ExceptionEvent) -> Result<(), LogError> {
        let body = serde_json::to_vec(event).map_err(|e| LogError::InternalError(e.to_string()))?;

        let mut request = self
            .client
            .post(self.endpoint.url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);
        if let Some(auth) = &self.endpoint.auth {
            request = request.header(AUTH_HEADER, auth.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| LogError::HttpError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LogError::HttpError(format!("Status: {}", response.status().as_u16())))
        }
    }
}

/// Error level only. Needs `error_endpoint` and a tokio runtime.
pub fn plugin(settings: &Settings) -> Result<Enrichment, LogError> {
    let raw = settings
        .error_endpoint
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| LogError::plugin("sentry", "LOG_ERROR_ENDPOINT / SENTRY_DSN is not set"))?;

    let reporter = ExceptionReporter::spawn(Endpoint::parse(raw)?)?;
    Ok(Enrichment::wrap(
        move |data, msg| reporter.report(ExceptionEvent::capture(data, msg)),
        &[LogLevel::Error],
    ))
}
