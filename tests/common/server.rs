//! wiremock helpers for the archive API

use openarchive_console::api::ArchiveClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::fixtures::{config_for, TOKEN};

/// Client with the test bearer token against `server`
pub fn client(server: &MockServer) -> ArchiveClient {
    ArchiveClient::new(&config_for(&server.uri()))
        .expect("client builds")
        .with_token(Some(TOKEN.to_string()))
}

/// Accept every audit append so workflows can log freely
pub async fn mount_audit_sink(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/audit-logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "logged", "hash": "h1"})))
        .mount(server)
        .await;
}

/// Requests received for `path`, in order
pub async fn requests_to(server: &MockServer, wanted: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == wanted)
        .collect()
}

/// Audit entries the server received, as JSON bodies
pub async fn audit_entries(server: &MockServer) -> Vec<Value> {
    requests_to(server, "/api/v1/admin/audit-logs")
        .await
        .into_iter()
        .filter(|r| r.method.to_string() == "POST")
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}
