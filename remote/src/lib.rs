//! Client for the MossByte remote data service.
//!
//! # Addressing
//!
//! Every request goes to `base_url + key`. The public key reads the document;
//! the private key administers it. Keys are part of the URL, so URLs are never
//! logged.
//!
//! | Operation | Request | Result |
//! |-----------|---------|--------|
//! | [`RemoteClient::find_database`] | `GET base+public` | database id, `""` when absent |
//! | [`RemoteClient::create_database`] | `POST base+public` | database id, `""` when absent |
//! | [`RemoteClient::fetch_document`] | `GET base+public` | the stored document |
//! | [`RemoteClient::put_object`] | `PUT base+private` | service status |
//! | [`RemoteClient::apply_instructions`] | `PATCH base+private` | service status |
//!
//! # Error Handling
//!
//! Every failure comes back as a [`RemoteError`]: transport errors, non-2xx
//! statuses (with a bounded excerpt of the body), and bodies that are not the
//! JSON envelope the service promises.
//!
//! # Retries
//!
//! `GET` and `PUT` are retried per [`RetryConfig`]. `POST` and `PATCH` get a
//! single attempt; see [`retry`].

pub mod retry;

use std::time::Duration;

use moss_types::{AccessKey, Instruction};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use retry::RetryConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Label attached to both keys when a database is created.
pub const DEFAULT_LABEL: &str = "moss-todo";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether the service answered at all.
    #[must_use]
    pub const fn is_http_status(&self) -> bool {
        matches!(self, RemoteError::Status { .. })
    }

    /// The HTTP status the service answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Connection settings for a [`RemoteClient`].
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// Address the keys are appended to, including any trailing slash.
    pub base_url: String,
    /// Label stored alongside both keys on creation.
    pub label: String,
    /// Overall timeout for a single attempt.
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl RemoteSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            label: DEFAULT_LABEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// A stored document as returned under `data.mossByte`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RemoteDocument {
    #[serde(default)]
    pub id: Option<String>,
    /// The stored payload. Any JSON shape; callers classify it before use.
    #[serde(default)]
    pub object: Value,
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<EnvelopeData>,
    #[serde(default)]
    status: Value,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    #[serde(rename = "mossByte", default)]
    moss_byte: Option<RemoteDocument>,
}

impl Envelope {
    fn database_id(self) -> String {
        self.data
            .and_then(|data| data.moss_byte)
            .and_then(|doc| doc.id)
            .unwrap_or_default()
    }

    fn status_text(&self) -> String {
        match &self.status {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    object: [Value; 1],
    keys: CreateKeys<'a>,
}

#[derive(Serialize)]
struct CreateKeys<'a> {
    read: [LabelledKey<'a>; 1],
    admin: [LabelledKey<'a>; 1],
}

#[derive(Serialize)]
struct LabelledKey<'a> {
    key: &'a str,
    label: &'a str,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    object: &'a Value,
}

#[derive(Serialize)]
struct PatchRequest<'a> {
    instructions: &'a [Instruction],
}

/// Handle to the remote data service. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    label: String,
    retry: RetryConfig,
}

impl RemoteClient {
    pub fn new(settings: RemoteSettings) -> Result<Self, RemoteError> {
        let RemoteSettings {
            base_url,
            label,
            request_timeout,
            retry,
        } = settings;

        let parsed = Url::parse(&base_url).map_err(|e| RemoteError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(RemoteError::InvalidBaseUrl {
                url: base_url,
                reason: "not a hierarchical url".to_string(),
            });
        }

        let http = base_client_builder()
            .timeout(request_timeout)
            .build()
            .map_err(RemoteError::Transport)?;

        Ok(Self {
            http,
            base_url,
            label,
            retry,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Id of the database readable with `public`, or `""` if there is none.
    pub async fn find_database(&self, public: &AccessKey) -> Result<String, RemoteError> {
        let envelope = self.exchange(Method::GET, public, None).await?;
        Ok(envelope.database_id())
    }

    /// Create a database readable with `public` and administered with `private`.
    ///
    /// Returns the new id, or `""` if the service did not report one.
    pub async fn create_database(
        &self,
        public: &AccessKey,
        private: &AccessKey,
    ) -> Result<String, RemoteError> {
        let body = CreateRequest {
            object: [Value::Object(serde_json::Map::new())],
            keys: CreateKeys {
                read: [LabelledKey {
                    key: public.expose_secret(),
                    label: &self.label,
                }],
                admin: [LabelledKey {
                    key: private.expose_secret(),
                    label: &self.label,
                }],
            },
        };
        let envelope = self
            .exchange(Method::POST, public, Some(to_body(&body)?))
            .await?;
        Ok(envelope.database_id())
    }

    /// The stored document, or an empty one when the envelope carries none.
    pub async fn fetch_document(&self, public: &AccessKey) -> Result<RemoteDocument, RemoteError> {
        let envelope = self.exchange(Method::GET, public, None).await?;
        Ok(envelope
            .data
            .and_then(|data| data.moss_byte)
            .unwrap_or_default())
    }

    /// Replace the stored object wholesale.
    pub async fn put_object(
        &self,
        private: &AccessKey,
        object: &Value,
    ) -> Result<String, RemoteError> {
        let body = to_body(&PutRequest { object })?;
        let envelope = self.exchange(Method::PUT, private, Some(body)).await?;
        Ok(envelope.status_text())
    }

    /// Apply keyed edits to the stored object.
    pub async fn apply_instructions(
        &self,
        private: &AccessKey,
        instructions: &[Instruction],
    ) -> Result<String, RemoteError> {
        let body = to_body(&PatchRequest { instructions })?;
        let envelope = self.exchange(Method::PATCH, private, Some(body)).await?;
        Ok(envelope.status_text())
    }

    async fn exchange(
        &self,
        method: Method,
        key: &AccessKey,
        body: Option<Vec<u8>>,
    ) -> Result<Envelope, RemoteError> {
        let url = format!("{}{}", self.base_url, key.expose_secret());
        let retry = self.retry.for_method(&method);

        tracing::debug!(method = %method, "Remote request");

        let outcome = retry::send_with_retry(
            || {
                let request = self.http.request(method.clone(), &url);
                match &body {
                    Some(bytes) => request
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(bytes.clone()),
                    None => request,
                }
            },
            &retry,
        )
        .await;

        let response = handle_response(outcome).await?;
        let bytes = response.bytes().await.map_err(RemoteError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Vec<u8>, RemoteError> {
    serde_json::to_vec(value).map_err(|e| RemoteError::Malformed(e.to_string()))
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

async fn handle_response(outcome: retry::RetryOutcome) -> Result<reqwest::Response, RemoteError> {
    match outcome {
        retry::RetryOutcome::Success(response) => Ok(response),
        retry::RetryOutcome::HttpError(response) => {
            let status = response.status().as_u16();
            let body = read_capped_error_body(response).await;
            tracing::warn!(status, "Remote returned an error status");
            Err(RemoteError::Status { status, body })
        }
        retry::RetryOutcome::ConnectionError { attempts, source } => {
            tracing::warn!(attempts, "Remote unreachable");
            Err(RemoteError::Connection { attempts, source })
        }
        retry::RetryOutcome::NonRetryable(e) => Err(RemoteError::Transport(e)),
    }
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
