//! Mock remote service shared by the computation tests.

use std::time::Duration;

use moss_remote::{RemoteClient, RemoteSettings, RetryConfig};
use moss_types::{AccessKey, KeyPair};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::remote::RemoteContext;

pub(crate) const PUBLIC: &str = "pub-key";
pub(crate) const PRIVATE: &str = "priv-key";

pub(crate) fn id_envelope(id: &str) -> Value {
    json!({"data": {"mossByte": {"id": id}}})
}

/// A stored document with id `db-1` holding `object`.
pub(crate) fn document(object: Value) -> Value {
    json!({"data": {"mossByte": {"id": "db-1", "object": object}}})
}

pub(crate) fn status(text: &str) -> Value {
    json!({"status": text})
}

pub(crate) struct MockRemote {
    pub(crate) server: MockServer,
}

impl MockRemote {
    pub(crate) async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub(crate) fn client(&self) -> RemoteClient {
        let mut settings = RemoteSettings::new(format!("{}/api/v1/", self.server.uri()));
        settings.retry = RetryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        };
        RemoteClient::new(settings).unwrap()
    }

    pub(crate) fn keys() -> KeyPair {
        KeyPair::new(
            AccessKey::new(PUBLIC).unwrap(),
            AccessKey::new(PRIVATE).unwrap(),
        )
    }

    pub(crate) fn context(&self) -> RemoteContext {
        RemoteContext::new(self.client(), Self::keys())
    }

    pub(crate) async fn on_public(&self, verb: &str, response: ResponseTemplate) {
        self.on(verb, PUBLIC, response).await;
    }

    pub(crate) async fn on_private(&self, verb: &str, response: ResponseTemplate) {
        self.on(verb, PRIVATE, response).await;
    }

    /// Fail the test if any `verb` request arrives.
    pub(crate) async fn never(&self, verb: &str) {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    pub(crate) async fn request_count(&self, verb: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.method.as_str() == verb)
            .count()
    }

    /// Body of the last `verb` request, parsed as JSON.
    pub(crate) async fn last_body(&self, verb: &str) -> Value {
        let requests = self.server.received_requests().await.unwrap_or_default();
        let request = requests
            .iter()
            .rev()
            .find(|request| request.method.as_str() == verb)
            .unwrap_or_else(|| panic!("no {verb} request received"));
        serde_json::from_slice(&request.body).unwrap()
    }

    async fn on(&self, verb: &str, key: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(format!("/api/v1/{key}")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}
