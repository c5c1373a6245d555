//! Shared test utilities and fixtures
//!
//! A mock MossByte service holding one document in memory, so a session can
//! run several computations against it and observe each other's writes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use moss_remote::{RemoteClient, RemoteSettings, RetryConfig};
use moss_todo::TodoSession;
use moss_types::{AccessKey, KeyPair};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PUBLIC: &str = "public-key";
pub const PRIVATE: &str = "private-key";
pub const DATABASE_ID: &str = "00dcbab4-a21c-4744-93f8-9a4abf4e06e0";

/// Stored state of the fake service. `None` until a database is created.
pub type Store = Arc<Mutex<Option<Value>>>;

pub struct FakeMoss {
    pub server: MockServer,
    pub store: Store,
}

impl FakeMoss {
    /// A service with no database yet.
    pub async fn empty() -> Self {
        Self::with_store(None).await
    }

    /// A service whose database already holds `object`.
    pub async fn holding(object: Value) -> Self {
        Self::with_store(Some(object)).await
    }

    async fn with_store(initial: Option<Value>) -> Self {
        let server = MockServer::start().await;
        let store: Store = Arc::new(Mutex::new(initial));

        let read = Arc::clone(&store);
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{PUBLIC}")))
            .respond_with(move |_: &Request| match read.lock().unwrap().clone() {
                Some(object) => ResponseTemplate::new(200).set_body_json(json!({
                    "data": {"mossByte": {"id": DATABASE_ID, "object": object}}
                })),
                None => ResponseTemplate::new(200).set_body_json(json!({"data": {}})),
            })
            .mount(&server)
            .await;

        let create = Arc::clone(&store);
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/{PUBLIC}")))
            .respond_with(move |_: &Request| {
                *create.lock().unwrap() = Some(json!([{}]));
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"mossByte": {"id": DATABASE_ID}}}))
            })
            .mount(&server)
            .await;

        let put = Arc::clone(&store);
        Mock::given(method("PUT"))
            .and(path(format!("/api/v1/{PRIVATE}")))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                *put.lock().unwrap() = Some(body["object"].clone());
                ResponseTemplate::new(200).set_body_json(json!({"status": "success"}))
            })
            .mount(&server)
            .await;

        let patch = Arc::clone(&store);
        Mock::given(method("PATCH"))
            .and(path(format!("/api/v1/{PRIVATE}")))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                let mut stored = patch.lock().unwrap();
                if let Some(object) = stored.as_mut() {
                    for instruction in body["instructions"].as_array().unwrap() {
                        apply(object, instruction);
                    }
                }
                ResponseTemplate::new(200).set_body_json(json!({"status": "success"}))
            })
            .mount(&server)
            .await;

        Self { server, store }
    }

    pub fn client(&self) -> RemoteClient {
        let mut settings = RemoteSettings::new(format!("{}/api/v1/", self.server.uri()));
        settings.request_timeout = Duration::from_secs(5);
        settings.retry = RetryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        };
        RemoteClient::new(settings).unwrap()
    }

    pub fn session(&self) -> TodoSession {
        TodoSession::new(self.client(), keys())
    }

    pub fn stored(&self) -> Option<Value> {
        self.store.lock().unwrap().clone()
    }

    pub async fn request_count(&self, verb: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.method.as_str() == verb)
            .count()
    }
}

pub fn keys() -> KeyPair {
    KeyPair::new(
        AccessKey::new(PUBLIC).unwrap(),
        AccessKey::new(PRIVATE).unwrap(),
    )
}

/// Apply one `{"function", "key", "value"?}` instruction to a stored object.
fn apply(object: &mut Value, instruction: &Value) {
    let key = instruction["key"].as_str().unwrap();
    let (item, field) = match key.split_once('.') {
        Some((item, field)) => (item, Some(field)),
        None => (key, None),
    };
    let Some(entries) = object.as_object_mut() else {
        return;
    };

    match (instruction["function"].as_str().unwrap(), field) {
        ("unset", None) => {
            entries.remove(item);
        }
        ("set", Some(field)) => {
            if let Some(entry) = entries.get_mut(item) {
                entry[field] = instruction["value"].clone();
            }
        }
        ("toggle", Some(field)) => {
            if let Some(entry) = entries.get_mut(item) {
                let flipped = !entry[field].as_bool().unwrap_or(false);
                entry[field] = Value::Bool(flipped);
            }
        }
        other => panic!("unsupported instruction {other:?}"),
    }
}
